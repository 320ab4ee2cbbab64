// src/data_analysis/mod.rs

pub mod aggregate;
pub mod time_axis;
