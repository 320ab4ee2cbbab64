// src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use growth_curves::{
    read_raw_readings, render, render_per_group, summarize, LineColors, PlateConfig,
    ReaderOptions, RenderOptions, SummaryTable, TimeAxis, TimeUnit,
};
use growth_curves::constants::TIME_COLUMN;

/// Summarize and plot multi-well growth-curve readings
#[derive(Parser)]
#[command(name = "growth_curves")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Average wells per sample, subtract blanks and write a summary table
    Summarize {
        /// Raw plate-reader export
        #[arg(value_name = "RAW")]
        raw: PathBuf,

        /// Tab-delimited group/sample/wells configuration
        #[arg(short, long, value_name = "CONFIG")]
        config: PathBuf,

        /// Summary output path (defaults to <RAW stem>_summary.tsv next to the input)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Time unit of the summary: minutes, hours or days
        #[arg(short, long, default_value = "hours")]
        unit: String,

        /// Fixed sampling interval in minutes (default: use the recorded Time column)
        #[arg(long, conflicts_with = "timepoints")]
        interval_minutes: Option<f64>,

        /// File with one time value per timepoint, replacing the time column
        #[arg(long, value_name = "FILE")]
        timepoints: Option<PathBuf>,

        /// Lines before the header row (default: find the line starting with "Time")
        #[arg(long)]
        skip_rows: Option<usize>,

        /// Field delimiter of the raw export
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Also draw all series into this image
        #[arg(long, value_name = "IMAGE")]
        graph: Option<PathBuf>,

        /// Also draw one image per group, named <PREFIX>.<group>.png
        #[arg(long, value_name = "PREFIX")]
        graph_groups: Option<PathBuf>,

        #[command(flatten)]
        chart: ChartArgs,
    },

    /// Draw charts from a previously written summary table
    Graph {
        /// Summary table written by `summarize`
        #[arg(value_name = "SUMMARY")]
        summary: PathBuf,

        /// Image path, or file prefix with --per-group
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Draw one image per group
        #[arg(long)]
        per_group: bool,

        /// Time unit of the summary's time column, used for the default x axis description
        #[arg(short, long, default_value = "hours")]
        unit: String,

        #[command(flatten)]
        chart: ChartArgs,
    },
}

#[derive(Args)]
struct ChartArgs {
    /// Chart title
    #[arg(long)]
    title: Option<String>,

    /// X axis description (default follows the time unit; plain "Time" for --timepoints)
    #[arg(long)]
    x_label: Option<String>,

    /// Y axis description
    #[arg(long, default_value = "OD600")]
    y_label: String,

    /// Gradient name (rainbow, viridis, ...), a single color, or a comma list of colors
    #[arg(long)]
    colors: Option<String>,

    /// Leave out the legend
    #[arg(long)]
    no_legend: bool,

    /// Marker radius in pixels (0 for lines only)
    #[arg(long, default_value = "3")]
    marker_size: u32,

    /// Write each series name at the end of its curve
    #[arg(long)]
    end_labels: bool,

    /// Only plot these groups (comma separated)
    #[arg(long, value_delimiter = ',')]
    groups: Option<Vec<String>>,

    /// Only plot these Group__Sample series (comma separated)
    #[arg(long, value_delimiter = ',')]
    samples: Option<Vec<String>>,

    /// Image width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "800")]
    height: u32,
}

impl ChartArgs {
    fn render_options(&self, default_x_label: &str) -> Result<RenderOptions> {
        let mut options = RenderOptions {
            title: self.title.clone(),
            x_label: self
                .x_label
                .clone()
                .unwrap_or_else(|| default_x_label.to_string()),
            y_label: self.y_label.clone(),
            width: self.width,
            height: self.height,
            legend: !self.no_legend,
            marker_size: self.marker_size,
            end_labels: self.end_labels,
            groups: self.groups.clone(),
            samples: self.samples.clone(),
            ..Default::default()
        };
        if let Some(colors) = &self.colors {
            options.line_colors = LineColors::parse(colors)?;
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Summarize {
            raw,
            config,
            output,
            unit,
            interval_minutes,
            timepoints,
            skip_rows,
            delimiter,
            graph,
            graph_groups,
            chart,
        } => {
            let unit: TimeUnit = unit.parse()?;
            let time_axis = match (interval_minutes, timepoints) {
                (Some(interval_minutes), _) => TimeAxis::Interval {
                    unit,
                    interval_minutes,
                },
                (None, Some(path)) => TimeAxis::Explicit(read_timepoints(&path)?),
                (None, None) => TimeAxis::Recorded(unit),
            };
            if !delimiter.is_ascii() {
                bail!("delimiter must be a single ASCII character, got '{delimiter}'");
            }
            let reader_options = ReaderOptions {
                skip_rows,
                delimiter: delimiter as u8,
            };
            let x_label = time_axis.unit().map_or(TIME_COLUMN, TimeUnit::axis_label);
            run_summarize(
                &raw,
                &config,
                output,
                &time_axis,
                &reader_options,
                graph.as_deref(),
                graph_groups.as_deref(),
                &chart.render_options(x_label)?,
            )
        }
        Commands::Graph {
            summary,
            output,
            per_group,
            unit,
            chart,
        } => {
            let unit: TimeUnit = unit.parse()?;
            run_graph(&summary, &output, per_group, &chart.render_options(unit.axis_label())?)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_summarize(
    raw: &Path,
    config: &Path,
    output: Option<PathBuf>,
    time_axis: &TimeAxis,
    reader_options: &ReaderOptions,
    graph: Option<&Path>,
    graph_groups: Option<&Path>,
    render_options: &RenderOptions,
) -> Result<()> {
    let config = PlateConfig::from_file(config)
        .with_context(|| format!("Failed to load configuration '{}'", config.display()))?;
    let readings = read_raw_readings(raw, reader_options)
        .with_context(|| format!("Failed to read raw readings '{}'", raw.display()))?;
    let table = summarize(&readings, &config, time_axis).context("Summarization failed")?;

    let output = output.unwrap_or_else(|| default_summary_path(raw));
    table
        .write_tsv(&output)
        .with_context(|| format!("Failed to write summary '{}'", output.display()))?;
    println!("Summary saved as '{}'.", output.display());

    if let Some(graph) = graph {
        render(&table, graph, render_options)?;
        println!("Chart saved as '{}'.", graph.display());
    }
    if let Some(prefix) = graph_groups {
        render_per_group(&table, prefix, render_options)?;
        println!("Per-group charts saved with prefix '{}'.", prefix.display());
    }
    Ok(())
}

fn run_graph(summary: &Path, output: &Path, per_group: bool, render_options: &RenderOptions) -> Result<()> {
    let table = SummaryTable::read_tsv(summary)
        .with_context(|| format!("Failed to load summary '{}'", summary.display()))?;
    info!(
        "Loaded {} series over {} timepoints ({} groups)",
        table.series().len(),
        table.len(),
        table.groups().len()
    );

    if per_group {
        render_per_group(&table, output, render_options)?;
        println!("Per-group charts saved with prefix '{}'.", output.display());
    } else {
        render(&table, output, render_options)?;
        println!("Chart saved as '{}'.", output.display());
    }
    Ok(())
}

/// `<dir>/<stem>_summary.tsv` next to the raw input.
fn default_summary_path(raw: &Path) -> PathBuf {
    let root_name = raw.file_stem().unwrap_or_default().to_string_lossy();
    raw.with_file_name(format!("{root_name}_summary.tsv"))
}

fn read_timepoints(path: &Path) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read timepoints '{}'", path.display()))?;
    text.split_whitespace()
        .map(|value| {
            value
                .parse::<f64>()
                .with_context(|| format!("'{value}' in '{}' is not a number", path.display()))
        })
        .collect()
}
