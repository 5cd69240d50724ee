//! The three life-cycle charts: income / resources / consumption means, and
//! the risky share band with and without the 100-minus-age rule

use std::path::{Path, PathBuf};

use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use super::{save_figure, Figure};
use crate::aggregation::{AgeSummary, AgeTable, Column};
use crate::error::Result;

// Default matplotlib colour cycle
const C0: RGBColor = RGBColor(31, 119, 180);
const C1: RGBColor = RGBColor(255, 127, 14);
const C2: RGBColor = RGBColor(44, 160, 44);

const CAPTION_FONT: (&str, u32) = ("sans-serif", 20);
const PERCENTILE_LABEL: &str = "Perc. 5 and 95";

fn legend_line(color: RGBColor) -> impl Fn((i32, i32)) -> PathElement<(i32, i32)> {
    move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color)
}

fn x_bounds<'a>(series: impl IntoIterator<Item = &'a (f64, f64)>) -> (f64, f64) {
    let (lo, hi) = series
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, _)| {
            (lo.min(*x), hi.max(*x))
        });
    if lo.is_finite() && hi > lo {
        (lo, hi)
    } else if lo.is_finite() {
        (lo - 1.0, lo + 1.0)
    } else {
        (0.0, 1.0)
    }
}

/// Mean income, market resources and consumption by age
pub struct IncomeConsumptionMeans<'a> {
    means: &'a AgeTable,
}

impl<'a> IncomeConsumptionMeans<'a> {
    pub fn new(means: &'a AgeTable) -> Self {
        Self { means }
    }
}

impl Figure for IncomeConsumptionMeans<'_> {
    fn name(&self) -> &str {
        "YMC_Means"
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;

        let lines = [
            ("Income", self.means.series(Column::PIncome), C0),
            ("Market resources", self.means.series(Column::M), C1),
            ("Consumption", self.means.series(Column::Cons), C2),
        ];

        let (x_lo, x_hi) = x_bounds(lines.iter().flat_map(|(_, s, _)| s.iter()));
        let y_max = lines
            .iter()
            .flat_map(|(_, s, _)| s.iter().map(|(_, y)| *y))
            .filter(|y| y.is_finite())
            .fold(0.0f64, f64::max);
        let y_hi = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

        let mut chart = ChartBuilder::on(root)
            .caption("Variable Means Conditional on Survival", CAPTION_FONT)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)?;

        chart.configure_mesh().x_desc("Age").draw()?;

        for (label, points, color) in lines {
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(label)
                .legend(legend_line(color));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    }
}

/// Mean risky share with its 5th / 95th percentile band, optionally
/// compared against the 100-minus-age rule
pub struct RiskyShareBands<'a> {
    summary: &'a AgeSummary,
    rule: Option<&'a [(u32, f64)]>,
}

impl<'a> RiskyShareBands<'a> {
    pub fn new(summary: &'a AgeSummary) -> Self {
        Self {
            summary,
            rule: None,
        }
    }

    /// Add the rule-of-thumb line; the figure is saved as `RShare_Means_100_age`
    pub fn with_rule(mut self, rule: &'a [(u32, f64)]) -> Self {
        self.rule = Some(rule);
        self
    }
}

impl RiskyShareBands<'_> {
    /// 5th then 95th percentile series; only the upper line carries the
    /// shared legend entry
    fn percentile_lines(&self) -> [(Vec<(f64, f64)>, Option<&'static str>); 2] {
        [
            (self.summary.lower.series(Column::RShare), None),
            (
                self.summary.upper.series(Column::RShare),
                Some(PERCENTILE_LABEL),
            ),
        ]
    }
}

impl Figure for RiskyShareBands<'_> {
    fn name(&self) -> &str {
        match self.rule {
            Some(_) => "RShare_Means_100_age",
            None => "RShare_Means",
        }
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;

        let mean = self.summary.means.series(Column::RShare);
        let rule: Vec<(f64, f64)> = self
            .rule
            .unwrap_or(&[])
            .iter()
            .map(|(age, share)| (*age as f64, *share))
            .collect();

        let (x_lo, x_hi) = x_bounds(mean.iter().chain(rule.iter()));

        let mut chart = ChartBuilder::on(root)
            .caption(
                "Risky Portfolio Share Mean Conditional on Survival",
                CAPTION_FONT,
            )
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0..1.1)?;

        chart
            .configure_mesh()
            .x_desc("Age")
            .y_desc("Risky Share")
            .draw()?;

        chart
            .draw_series(LineSeries::new(mean, C0.stroke_width(2)))?
            .label("Mean")
            .legend(legend_line(C0));

        for (points, label) in self.percentile_lines() {
            let anno = chart.draw_series(DashedLineSeries::new(points, 6, 4, BLACK.into()))?;
            if let Some(label) = label {
                anno.label(label).legend(legend_line(BLACK));
            }
        }

        if !rule.is_empty() {
            chart
                .draw_series(DashedLineSeries::new(rule, 6, 4, C1.stroke_width(2)))?
                .label("100-age rule")
                .legend(legend_line(C1));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    }
}

/// Render YMC_Means, RShare_Means and RShare_Means_100_age into `dir`
pub fn render_all(summary: &AgeSummary, rule: &[(u32, f64)], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = save_figure(&IncomeConsumptionMeans::new(&summary.means), dir)?;
    written.extend(save_figure(&RiskyShareBands::new(summary), dir)?);
    written.extend(save_figure(&RiskyShareBands::new(summary).with_rule(rule), dir)?);

    info!("Wrote {} figure files to {}", written.len(), dir.display());
    Ok(written)
}
