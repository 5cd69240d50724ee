//! Chart rendering
//!
//! Every figure is drawn once onto an in-memory RGB bitmap (encoded to PNG,
//! JPG and a JPEG-backed PDF) and once onto an SVG backend, so each chart
//! produces exactly four files named `<figure>.<ext>`.

mod charts;
mod pdf;

pub use charts::{render_all, IncomeConsumptionMeans, RiskyShareBands};
pub use pdf::jpeg_page;

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{PortfolioError, Result};

/// Figure size in pixels
pub const FIGURE_WIDTH: u32 = 800;
pub const FIGURE_HEIGHT: u32 = 600;

/// Output formats written for every figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureFormat {
    Png,
    Jpg,
    Pdf,
    Svg,
}

impl FigureFormat {
    pub const ALL: [FigureFormat; 4] = [
        FigureFormat::Png,
        FigureFormat::Jpg,
        FigureFormat::Pdf,
        FigureFormat::Svg,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            FigureFormat::Png => "png",
            FigureFormat::Jpg => "jpg",
            FigureFormat::Pdf => "pdf",
            FigureFormat::Svg => "svg",
        }
    }
}

/// A chart that can draw itself onto any plotters backend
pub trait Figure {
    /// File stem of the saved figure
    fn name(&self) -> &str;

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>>;
}

fn plot_error<E>(figure: &str, err: DrawingAreaErrorKind<E>) -> PortfolioError
where
    E: std::error::Error + Send + Sync,
{
    PortfolioError::Plot {
        figure: figure.to_string(),
        message: err.to_string(),
    }
}

fn encode(image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

/// Draw `figure` and write it in every `FigureFormat` under `dir`.
///
/// The directory is created if missing. Returns the written paths in
/// `FigureFormat::ALL` order.
pub fn save_figure<F: Figure>(figure: &F, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let name = figure.name();
    let path_for = |format: FigureFormat| dir.join(format!("{}.{}", name, format.extension()));

    let mut buffer = vec![0u8; (FIGURE_WIDTH * FIGURE_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (FIGURE_WIDTH, FIGURE_HEIGHT))
            .into_drawing_area();
        figure.draw(&root).map_err(|e| plot_error(name, e))?;
        root.present().map_err(|e| plot_error(name, e))?;
    }
    let image = RgbImage::from_raw(FIGURE_WIDTH, FIGURE_HEIGHT, buffer).ok_or_else(|| {
        PortfolioError::Plot {
            figure: name.to_string(),
            message: "bitmap buffer does not match figure size".to_string(),
        }
    })?;

    let png = encode(&image, ImageFormat::Png)?;
    fs::write(path_for(FigureFormat::Png), png)?;

    let jpg = encode(&image, ImageFormat::Jpeg)?;
    fs::write(
        path_for(FigureFormat::Pdf),
        jpeg_page(&jpg, FIGURE_WIDTH, FIGURE_HEIGHT),
    )?;
    fs::write(path_for(FigureFormat::Jpg), jpg)?;

    let svg_path = path_for(FigureFormat::Svg);
    {
        let root = SVGBackend::new(&svg_path, (FIGURE_WIDTH, FIGURE_HEIGHT)).into_drawing_area();
        figure.draw(&root).map_err(|e| plot_error(name, e))?;
        root.present().map_err(|e| plot_error(name, e))?;
    }

    let paths: Vec<PathBuf> = FigureFormat::ALL.iter().map(|f| path_for(*f)).collect();
    debug!("Saved figure {} to {}", name, dir.display());
    Ok(paths)
}

/// Whether a sans-serif font can be loaded for chart text
pub fn fonts_available() -> bool {
    ("sans-serif", 12).into_font().box_size("Age").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Diagonal;

    impl Figure for Diagonal {
        fn name(&self) -> &str {
            "diagonal"
        }

        fn draw<DB: DrawingBackend>(
            &self,
            root: &DrawingArea<DB, Shift>,
        ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
            root.fill(&WHITE)?;
            let mut chart = ChartBuilder::on(root).build_cartesian_2d(0.0..1.0, 0.0..1.0)?;
            chart.draw_series(LineSeries::new(vec![(0.0, 0.0), (1.0, 1.0)], &BLACK))?;
            Ok(())
        }
    }

    #[test]
    fn test_extensions() {
        let exts: Vec<&str> = FigureFormat::ALL.iter().map(|f| f.extension()).collect();
        assert_eq!(exts, vec!["png", "jpg", "pdf", "svg"]);
    }

    #[test]
    fn test_save_writes_four_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("Figures");

        let paths = save_figure(&Diagonal, &out).unwrap();
        assert_eq!(paths.len(), 4);
        for (path, format) in paths.iter().zip(FigureFormat::ALL) {
            assert_eq!(path.extension().unwrap(), format.extension());
            assert_eq!(path.file_stem().unwrap(), "diagonal");
            assert!(fs::metadata(path).unwrap().len() > 0);
        }

        let png = fs::read(&paths[0]).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let jpg = fs::read(&paths[1]).unwrap();
        assert!(jpg.starts_with(&[0xFF, 0xD8]));
        let pdf = fs::read(&paths[2]).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        let svg = fs::read_to_string(&paths[3]).unwrap();
        assert!(svg.contains("<svg"));
    }
}
