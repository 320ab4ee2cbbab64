// src/plot_functions/plot_growth_curves.rs

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{info, warn};
use plotters::style::colors::full_palette::{BROWN, GREY, ORANGE, PINK, PURPLE, TEAL};
use plotters::style::colors::{BLACK, BLUE, CYAN, GREEN, MAGENTA, RED, YELLOW};
use plotters::style::RGBColor;

use crate::constants::{
    DEFAULT_GRADIENT, DEFAULT_MARKER_SIZE, DEFAULT_X_LABEL, DEFAULT_Y_LABEL, LINE_WIDTH_PLOT,
    PLOT_HEIGHT, PLOT_WIDTH,
};
use crate::error::{Error, Result};
use crate::plot_framework::{
    calculate_range, draw_chart_to_file, finite_bounds, ChartConfig, OutputFormat, PlotSeries,
};
use crate::summary_table::SummaryTable;

/// How line colors are chosen for the plotted series.
#[derive(Debug, Clone)]
pub enum LineColors {
    /// A named gradient sampled evenly across all series (e.g. `rainbow`, `viridis`).
    Gradient(String),
    /// One color for every series.
    Single(RGBColor),
    /// One color per series, in plotting order.
    List(Vec<RGBColor>),
}

impl Default for LineColors {
    fn default() -> Self {
        LineColors::Gradient(DEFAULT_GRADIENT.to_string())
    }
}

impl LineColors {
    /// Parses `rainbow`, `red`, `#1f77b4` or a comma list of colors.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.contains(',') {
            let colors = value.split(',').map(parse_color).collect::<Result<Vec<_>>>()?;
            return Ok(LineColors::List(colors));
        }
        if gradient_by_name(value).is_some() {
            return Ok(LineColors::Gradient(value.to_ascii_lowercase()));
        }
        parse_color(value).map(LineColors::Single)
    }

    /// Resolves a color for each of `count` series.
    pub fn resolve(&self, count: usize) -> Result<Vec<RGBColor>> {
        match self {
            LineColors::Gradient(name) => {
                let gradient = gradient_by_name(name)
                    .ok_or_else(|| Error::Render(format!("unknown color gradient '{name}'")))?;
                Ok((0..count)
                    .map(|i| {
                        let t = if count > 1 { i as f64 / (count - 1) as f64 } else { 0.0 };
                        let c = gradient.eval_continuous(t);
                        RGBColor(c.r, c.g, c.b)
                    })
                    .collect())
            }
            LineColors::Single(color) => Ok(vec![*color; count]),
            LineColors::List(colors) => {
                if colors.len() != count {
                    return Err(Error::Render(format!(
                        "{} colors given for {count} series",
                        colors.len()
                    )));
                }
                Ok(colors.clone())
            }
        }
    }
}

fn gradient_by_name(name: &str) -> Option<colorous::Gradient> {
    let gradient = match name.to_ascii_lowercase().as_str() {
        "rainbow" => colorous::RAINBOW,
        "sinebow" => colorous::SINEBOW,
        "viridis" => colorous::VIRIDIS,
        "plasma" => colorous::PLASMA,
        "inferno" => colorous::INFERNO,
        "magma" => colorous::MAGMA,
        "turbo" => colorous::TURBO,
        "cividis" => colorous::CIVIDIS,
        "cool" => colorous::COOL,
        "warm" => colorous::WARM,
        _ => return None,
    };
    Some(gradient)
}

/// Parses a color name or a `#rrggbb` hex value.
pub fn parse_color(value: &str) -> Result<RGBColor> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 {
            if let Ok(rgb) = u32::from_str_radix(hex, 16) {
                return Ok(RGBColor((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8));
            }
        }
        return Err(Error::Render(format!("'{value}' is not a #rrggbb color")));
    }
    let color = match value.to_ascii_lowercase().as_str() {
        "black" => BLACK,
        "blue" => BLUE,
        "cyan" => CYAN,
        "green" => GREEN,
        "magenta" => MAGENTA,
        "red" => RED,
        "yellow" => YELLOW,
        "brown" => BROWN,
        "grey" | "gray" => GREY,
        "orange" => ORANGE,
        "pink" => PINK,
        "purple" => PURPLE,
        "teal" => TEAL,
        _ => return Err(Error::Render(format!("unknown color '{value}'"))),
    };
    Ok(color)
}

/// Chart settings for [`render`] and [`render_per_group`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    pub line_colors: LineColors,
    /// Color overrides keyed by `Group__Sample`.
    pub series_colors: HashMap<String, RGBColor>,
    /// Legend label overrides keyed by `Group__Sample`.
    pub series_labels: HashMap<String, String>,
    pub legend: bool,
    pub marker_size: u32,
    pub stroke_width: u32,
    pub end_labels: bool,
    /// Restrict the chart to these groups.
    pub groups: Option<Vec<String>>,
    /// Restrict the chart to these `Group__Sample` keys; wins over `groups`.
    pub samples: Option<Vec<String>>,
    /// Image format; taken from the file extension when unset.
    pub format: Option<OutputFormat>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: None,
            x_label: DEFAULT_X_LABEL.to_string(),
            y_label: DEFAULT_Y_LABEL.to_string(),
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
            line_colors: LineColors::default(),
            series_colors: HashMap::new(),
            series_labels: HashMap::new(),
            legend: true,
            marker_size: DEFAULT_MARKER_SIZE,
            stroke_width: LINE_WIDTH_PLOT,
            end_labels: false,
            groups: None,
            samples: None,
            format: None,
        }
    }
}

/// Draws every selected series of `table` as a line against the time column.
pub fn render<P: AsRef<Path>>(table: &SummaryTable, output_path: P, options: &RenderOptions) -> Result<()> {
    let selected = select_series(table, options);
    if selected.is_empty() {
        return Err(Error::Render("nothing to plot: the summary has no series or no timepoints".to_string()));
    }

    let (output_path, format) = resolve_output(output_path.as_ref(), options.format)?;
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(Error::Render(format!(
                "output directory '{}' does not exist",
                parent.display()
            )));
        }
    }

    let colors = options.line_colors.resolve(selected.series().len())?;
    let time = selected.time();
    let mut series = Vec::with_capacity(selected.series().len());
    let mut all_values = Vec::new();
    for ((key, values), default_color) in selected.series().iter().zip(colors) {
        let name = key.to_string();
        let data: Vec<(f64, f64)> = time
            .iter()
            .zip(values)
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .map(|(&t, &v)| (t, v))
            .collect();
        all_values.extend(data.iter().map(|&(_, v)| v));

        series.push(PlotSeries {
            data,
            label: options.series_labels.get(&name).cloned().unwrap_or(name.clone()),
            color: options.series_colors.get(&name).copied().unwrap_or(default_color),
            stroke_width: options.stroke_width,
            marker_size: options.marker_size,
        });
    }

    let (x_range, y_range) = plot_ranges(time, &all_values)?;

    let chart = ChartConfig {
        title: options.title.clone(),
        x_range,
        y_range,
        series,
        x_label: options.x_label.clone(),
        y_label: options.y_label.clone(),
        legend: options.legend,
        end_labels: options.end_labels,
    };

    draw_chart_to_file(&output_path, format, (options.width, options.height), &chart)
        .map_err(|e| Error::Render(format!("failed to draw '{}': {e}", output_path.display())))?;
    info!(
        "Chart with {} series saved as '{}' ({format})",
        selected.series().len(),
        output_path.display()
    );
    Ok(())
}

/// Draws one chart per group, named `{prefix}.{group}.{ext}`.
pub fn render_per_group<P: AsRef<Path>>(
    table: &SummaryTable,
    output_prefix: P,
    options: &RenderOptions,
) -> Result<()> {
    if table.is_empty() {
        return Err(Error::Render("nothing to plot: the summary has no series or no timepoints".to_string()));
    }

    let groups = match &options.groups {
        Some(wanted) => {
            let (subset, missing) = table.filter_groups(wanted);
            warn_missing("Group", &missing);
            subset.groups()
        }
        None => table.groups(),
    };
    if groups.is_empty() {
        return Err(Error::Render("none of the requested groups are in the summary".to_string()));
    }

    let format = options.format.unwrap_or(OutputFormat::Png);
    let prefix = output_prefix.as_ref().to_string_lossy().into_owned();
    for group in groups {
        let file_name = format!("{prefix}.{}.{}", group.replace('/', "_"), format.extension());
        let group_options = RenderOptions {
            groups: Some(vec![group]),
            samples: None,
            format: Some(format),
            ..options.clone()
        };
        render(table, PathBuf::from(file_name), &group_options)?;
    }
    Ok(())
}

/// Padded x and y ranges covering every finite point.
fn plot_ranges(time: &[f64], values: &[f64]) -> Result<(Range<f64>, Range<f64>)> {
    let (time_min, time_max) = finite_bounds(time)
        .ok_or_else(|| Error::Render("time column has no finite values".to_string()))?;
    let (value_min, value_max) = finite_bounds(values)
        .ok_or_else(|| Error::Render("series contain no finite values".to_string()))?;
    let (x_min, x_max) = calculate_range(time_min, time_max);
    let (y_min, y_max) = calculate_range(value_min, value_max);
    Ok((x_min..x_max, y_min..y_max))
}

fn select_series(table: &SummaryTable, options: &RenderOptions) -> SummaryTable {
    if options.samples.is_some() && options.groups.is_some() {
        warn!("Both groups and samples were requested; using samples");
    }
    if let Some(samples) = &options.samples {
        let (subset, missing) = table.filter_samples(samples);
        warn_missing("Sample", &missing);
        return subset;
    }
    if let Some(groups) = &options.groups {
        let (subset, missing) = table.filter_groups(groups);
        warn_missing("Group", &missing);
        return subset;
    }
    table.clone()
}

fn warn_missing(kind: &str, missing: &[String]) {
    for name in missing {
        warn!("{kind} '{name}' not found in the summary");
    }
}

/// Output path and format, with the extension adjusted when a format is forced.
fn resolve_output(path: &Path, format: Option<OutputFormat>) -> Result<(PathBuf, OutputFormat)> {
    match (format, OutputFormat::from_path(path)) {
        (Some(forced), Some(found)) if forced == found => Ok((path.to_path_buf(), forced)),
        (Some(forced), _) => Ok((path.with_extension(forced.extension()), forced)),
        (None, Some(found)) => Ok((path.to_path_buf(), found)),
        (None, None) => Err(Error::Render(format!(
            "cannot tell the image format of '{}' (use .png, .jpg, .bmp or .svg)",
            path.display()
        ))),
    }
}
