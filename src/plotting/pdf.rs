//! Single-page PDF wrapping a JPEG-encoded raster
//!
//! The page is sized to the image at 96 dpi and the JPEG stream is embedded
//! unchanged as a DCTDecode image XObject.

/// Points per pixel at 96 dpi
const PT_PER_PX: f64 = 72.0 / 96.0;

/// Build a one-page PDF document showing `jpeg` (RGB, `width` x `height` px)
pub fn jpeg_page(jpeg: &[u8], width: u32, height: u32) -> Vec<u8> {
    let page_w = width as f64 * PT_PER_PX;
    let page_h = height as f64 * PT_PER_PX;
    let content = format!("q {:.2} 0 0 {:.2} 0 0 cm /Im0 Do Q\n", page_w, page_h);

    let mut out: Vec<u8> = Vec::with_capacity(jpeg.len() + 1024);
    let mut offsets = Vec::with_capacity(5);

    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    offsets.push(out.len());
    out.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

    offsets.push(out.len());
    let page = format!(
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
         /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>\nendobj\n",
        page_w, page_h
    );
    out.extend_from_slice(page.as_bytes());

    offsets.push(out.len());
    let image_header = format!(
        "4 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} \
         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
        width,
        height,
        jpeg.len()
    );
    out.extend_from_slice(image_header.as_bytes());
    out.extend_from_slice(jpeg);
    out.extend_from_slice(b"\nendstream\nendobj\n");

    offsets.push(out.len());
    let contents = format!(
        "5 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n",
        content.len(),
        content
    );
    out.extend_from_slice(contents.as_bytes());

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
    for offset in &offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref_offset
    ));
    out.extend_from_slice(xref.as_bytes());

    out
}
