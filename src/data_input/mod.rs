// src/data_input/mod.rs

pub mod plate_config;
pub mod raw_readings;
pub mod well_range;
