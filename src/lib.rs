// src/lib.rs - Library interface for summarizing and plotting growth curves

pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod error;
pub mod font_config;
pub mod plot_framework;
pub mod plot_functions;
pub mod summary_table;
pub mod types;

pub use data_analysis::aggregate::summarize;
pub use data_analysis::time_axis::{TimeAxis, TimeUnit};
pub use data_input::plate_config::{PlateConfig, SampleGroup, SampleLayout, SampleSpec, WellAssignment};
pub use data_input::raw_readings::{read_raw_readings, RawReadings, ReaderOptions};
pub use data_input::well_range::parse_well_range;
pub use error::{Error, Result};
pub use plot_framework::OutputFormat;
pub use plot_functions::plot_growth_curves::{render, render_per_group, LineColors, RenderOptions};
pub use summary_table::{SeriesKey, SummaryTable};
