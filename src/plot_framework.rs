// src/plot_framework.rs

use plotters::backend::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::chart::{ChartBuilder, SeriesLabelPosition};
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, PathElement, Text};
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, WHITE};
use plotters::style::{Color, IntoFont, RGBColor};

use ndarray::ArrayView1;
use ndarray_stats::QuantileExt;

use std::error::Error;
use std::fmt;
use std::ops::Range;
use std::path::Path;

use crate::constants::LINE_WIDTH_LEGEND;
use crate::font_config::{
    FONT_TUPLE_AXIS_LABEL, FONT_TUPLE_END_LABEL, FONT_TUPLE_LEGEND, FONT_TUPLE_MAIN_TITLE,
};
use crate::types::SeriesPoints;

/// Image formats the chart backends can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Bmp,
    Svg,
}

impl OutputFormat {
    /// Picks the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "bmp" => Some(OutputFormat::Bmp),
            "svg" => Some(OutputFormat::Svg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Calculate plot range with padding.
/// Adds 5% padding, or a fixed padding for very small ranges.
pub fn calculate_range(min_val: f64, max_val: f64) -> (f64, f64) {
    let (min, max) = if min_val <= max_val {
        (min_val, max_val)
    } else {
        (max_val, min_val)
    };
    let range = (max - min).abs();
    let padding = if range < 1e-6 { 0.05 } else { range * 0.05 };
    (min - padding, max + padding)
}

/// Min and max of the finite values in `values`, if there are any.
pub fn finite_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let view = ArrayView1::from(&finite[..]);
    match (view.min(), view.max()) {
        (Ok(min), Ok(max)) => Some((*min, *max)),
        _ => None,
    }
}

/// Y-axis tick labels: k/M notation for large magnitudes, two decimals for
/// small fractional values such as optical densities.
pub fn format_axis_value(y: f64) -> String {
    if y.abs() >= 1_000_000.0 {
        format!("{:.1}M", y / 1_000_000.0)
    } else if y.abs() >= 1000.0 {
        format!("{:.0}k", y / 1000.0)
    } else if y.abs() < 10.0 && y.fract() != 0.0 {
        format!("{:.2}", y)
    } else {
        format!("{:.0}", y)
    }
}

#[derive(Clone, Debug)]
pub struct PlotSeries {
    pub data: SeriesPoints,
    pub label: String,
    pub color: RGBColor,
    pub stroke_width: u32,
    /// Circle radius drawn at every point; 0 draws the line only.
    pub marker_size: u32,
}

#[derive(Clone, Debug)]
pub struct ChartConfig {
    pub title: Option<String>,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub series: Vec<PlotSeries>,
    pub x_label: String,
    pub y_label: String,
    pub legend: bool,
    /// Write each series label next to its last point.
    pub end_labels: bool,
}

/// Draws one line chart with an optional legend onto `area`.
pub fn draw_line_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    config: &ChartConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(area);
    if let Some(title) = &config.title {
        builder.caption(title, FONT_TUPLE_MAIN_TITLE);
    }
    let mut chart = builder
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(config.x_range.clone(), config.y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .x_labels(10)
        .y_labels(10)
        .y_label_formatter(&|y| format_axis_value(*y))
        .light_line_style(WHITE.mix(0.7))
        .label_style(FONT_TUPLE_AXIS_LABEL)
        .draw()?;

    let mut legend_series_count = 0;
    for s in &config.series {
        if s.data.is_empty() {
            continue;
        }

        let color = s.color;
        let line = chart.draw_series(LineSeries::new(
            s.data.iter().cloned(),
            color.stroke_width(s.stroke_width),
        ))?;
        if config.legend && !s.label.is_empty() {
            line.label(&s.label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(LINE_WIDTH_LEGEND))
            });
            legend_series_count += 1;
        }

        if s.marker_size > 0 {
            chart.draw_series(
                s.data
                    .iter()
                    .map(|&point| Circle::new(point, s.marker_size as i32, color.filled())),
            )?;
        }

        if config.end_labels {
            if let Some(&last) = s.data.last() {
                let style = FONT_TUPLE_END_LABEL.into_font().color(&color);
                chart.draw_series(std::iter::once(Text::new(s.label.clone(), last, style)))?;
            }
        }
    }

    if legend_series_count > 0 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(FONT_TUPLE_LEGEND)
            .draw()?;
    }

    Ok(())
}

/// Renders a chart into an image file using the backend matching `format`.
pub fn draw_chart_to_file(
    output_path: &Path,
    format: OutputFormat,
    size: (u32, u32),
    config: &ChartConfig,
) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Svg => {
            let root_area = SVGBackend::new(output_path, size).into_drawing_area();
            root_area.fill(&WHITE)?;
            draw_line_chart(&root_area, config)?;
            root_area.present()?;
        }
        OutputFormat::Png | OutputFormat::Jpeg | OutputFormat::Bmp => {
            let root_area = BitMapBackend::new(output_path, size).into_drawing_area();
            root_area.fill(&WHITE)?;
            draw_line_chart(&root_area, config)?;
            root_area.present()?;
        }
    }
    Ok(())
}
