// src/error.rs

/// Errors raised while building a plate configuration, summarizing readings
/// or rendering charts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed well-range token or unreadable text value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Structural configuration problem (duplicates, length mismatches, bad options)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Referenced well or timepoint missing from the raw readings
    #[error("Data error: {0}")]
    Data(String),

    /// Output destination failure or nothing to draw
    #[error("Render error: {0}")]
    Render(String),

    /// I/O error reading or writing a file
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// src/error.rs
