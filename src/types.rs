// src/types.rs
// Type aliases shared across modules

/// 1-based plate position.
pub type Well = u32;

/// (time, value) points of a single plotted line.
pub type SeriesPoints = Vec<(f64, f64)>;

/// Key/value pairs found in a raw export before its column header line.
pub type FileMetadata = Vec<(String, String)>;
