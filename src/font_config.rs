// src/font_config.rs

// Font styles for plot rendering, centralized so every chart uses the same text settings.

use crate::constants::{
    FONT_SIZE_AXIS_LABEL, FONT_SIZE_END_LABEL, FONT_SIZE_LEGEND, FONT_SIZE_MAIN_TITLE,
};

/// Font family used for all chart text
pub const FONT_FAMILY: &str = "sans-serif";

// Tuple representations for use with plotters' IntoFont trait
pub const FONT_TUPLE_MAIN_TITLE: (&str, i32) = (FONT_FAMILY, FONT_SIZE_MAIN_TITLE);
pub const FONT_TUPLE_AXIS_LABEL: (&str, i32) = (FONT_FAMILY, FONT_SIZE_AXIS_LABEL);
pub const FONT_TUPLE_LEGEND: (&str, i32) = (FONT_FAMILY, FONT_SIZE_LEGEND);
pub const FONT_TUPLE_END_LABEL: (&str, i32) = (FONT_FAMILY, FONT_SIZE_END_LABEL);
