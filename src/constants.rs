// src/constants.rs

// Plot dimensions (8 x 8 inches at 100 dpi).
pub const PLOT_WIDTH: u32 = 800;
pub const PLOT_HEIGHT: u32 = 800;

// Default axis descriptions.
pub const DEFAULT_X_LABEL: &str = "Time (h)";
pub const DEFAULT_Y_LABEL: &str = "OD600";

// Default color gradient sampled across all plotted series.
pub const DEFAULT_GRADIENT: &str = "rainbow";

// Stroke widths for lines
pub const LINE_WIDTH_PLOT: u32 = 1;
pub const LINE_WIDTH_LEGEND: u32 = 2;

// Marker radius in pixels drawn at every timepoint (0 disables markers).
pub const DEFAULT_MARKER_SIZE: u32 = 3;

// Font sizes
pub const FONT_SIZE_MAIN_TITLE: i32 = 24;
pub const FONT_SIZE_AXIS_LABEL: i32 = 14;
pub const FONT_SIZE_LEGEND: i32 = 12;
pub const FONT_SIZE_END_LABEL: i32 = 11;

// --- Plate layout ---

/// Reserved sample name marking a group's background reference wells.
pub const BLANK_SAMPLE: &str = "blank";

/// Separator between group and sample in summary column names.
pub const KEY_SEPARATOR: &str = "__";

/// Header of the time column in raw and summary files.
pub const TIME_COLUMN: &str = "Time";

/// Wells per sample when a layout is generated from group/sample lists.
pub const DEFAULT_REPLICATES: u32 = 4;

// --- Raw readings input ---

pub const DEFAULT_RAW_DELIMITER: u8 = b',';

// src/constants.rs
