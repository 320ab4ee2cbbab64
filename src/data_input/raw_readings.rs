// src/data_input/raw_readings.rs

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use log::{debug, info, warn};
use ndarray::{Array2, ArrayView1, Axis};

use crate::constants::{DEFAULT_RAW_DELIMITER, TIME_COLUMN};
use crate::error::{Error, Result};
use crate::types::{FileMetadata, Well};

/// Optical-density readings indexed by (timepoint, well).
///
/// The value matrix has one row per timepoint and one column per well, so
/// every well always carries the same number of readings.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReadings {
    wells: Vec<Well>,
    values: Array2<f64>,
    elapsed_seconds: Option<Vec<f64>>,
    metadata: FileMetadata,
}

impl RawReadings {
    /// Builds readings from per-well columns. All columns must have the same length.
    pub fn from_columns(columns: Vec<(Well, Vec<f64>)>) -> Result<Self> {
        let timepoints = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut wells = Vec::with_capacity(columns.len());
        let mut values = Array2::<f64>::zeros((timepoints, columns.len()));

        for (col, (well, readings)) in columns.into_iter().enumerate() {
            if wells.contains(&well) {
                return Err(Error::Data(format!("well {well} appears more than once")));
            }
            if readings.len() != timepoints {
                return Err(Error::Data(format!(
                    "well {well} has {} readings but well {} has {timepoints}",
                    readings.len(),
                    wells.first().copied().unwrap_or(well)
                )));
            }
            for (row, value) in readings.into_iter().enumerate() {
                values[[row, col]] = value;
            }
            wells.push(well);
        }

        Ok(Self {
            wells,
            values,
            elapsed_seconds: None,
            metadata: Vec::new(),
        })
    }

    /// Attaches the elapsed time of every timepoint, in seconds.
    pub fn with_elapsed_seconds(mut self, elapsed: Vec<f64>) -> Result<Self> {
        if elapsed.len() != self.timepoint_count() {
            return Err(Error::Data(format!(
                "{} elapsed times given for {} timepoints",
                elapsed.len(),
                self.timepoint_count()
            )));
        }
        self.elapsed_seconds = Some(elapsed);
        Ok(self)
    }

    pub fn timepoint_count(&self) -> usize {
        self.values.nrows()
    }

    pub fn wells(&self) -> &[Well] {
        &self.wells
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Column index of `well` in [`RawReadings::values`].
    pub fn column_of(&self, well: Well) -> Option<usize> {
        self.wells.iter().position(|&w| w == well)
    }

    pub fn well_series(&self, well: Well) -> Option<ArrayView1<'_, f64>> {
        self.column_of(well).map(|col| self.values.index_axis(Axis(1), col))
    }

    pub fn elapsed_seconds(&self) -> Option<&[f64]> {
        self.elapsed_seconds.as_deref()
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }
}

/// How to locate and split the table inside a raw export.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Lines to skip before the header. `None` searches for the first line starting with `Time`.
    pub skip_rows: Option<usize>,
    pub delimiter: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            skip_rows: None,
            delimiter: DEFAULT_RAW_DELIMITER,
        }
    }
}

/// Reads a plate-reader export from disk (UTF-8 or UTF-16).
pub fn read_raw_readings<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Result<RawReadings> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let text = decode_text(&bytes)?;
    info!("Reading raw readings from '{}'", path.display());
    parse_raw_readings(&text, options)
}

/// Parses the text of a plate-reader export.
///
/// Lines before the header are kept as metadata when they hold at least two
/// fields. The header must contain integer-named well columns; a `Time`
/// column in `HH:MM:SS` is parsed into elapsed seconds when present.
pub fn parse_raw_readings(text: &str, options: &ReaderOptions) -> Result<RawReadings> {
    let lines: Vec<&str> = text.lines().collect();
    let header_line = match options.skip_rows {
        Some(skip) => skip,
        None => lines
            .iter()
            .position(|line| first_field(line, options.delimiter).eq_ignore_ascii_case(TIME_COLUMN))
            .ok_or_else(|| {
                Error::Data(format!("could not find a header line starting with '{TIME_COLUMN}'"))
            })?,
    };
    if header_line >= lines.len() {
        return Err(Error::Data(format!(
            "header expected at line {} but the file has {} lines",
            header_line + 1,
            lines.len()
        )));
    }

    let metadata = parse_preamble(&lines[..header_line], options.delimiter);
    debug!("Extracted {} metadata entries", metadata.len());

    let table = lines[header_line..].join("\n");
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(table.as_bytes());

    let headers = reader.headers()?.clone();
    let mut time_col: Option<usize> = None;
    let mut well_cols: Vec<(usize, Well)> = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        let header = header.trim_matches('"');
        if header.eq_ignore_ascii_case(TIME_COLUMN) {
            time_col = Some(idx);
        } else if let Ok(well) = header.parse::<Well>() {
            well_cols.push((idx, well));
        } else if !header.is_empty() {
            debug!("Ignoring non-well column '{header}'");
        }
    }
    if well_cols.is_empty() {
        return Err(Error::Data("no well columns found in the header".to_string()));
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); well_cols.len()];
    let mut time_values: Vec<String> = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = header_line + row_index + 2;
        for (slot, &(idx, well)) in well_cols.iter().enumerate() {
            let cell = record.get(idx).unwrap_or("");
            let value = cell.parse::<f64>().map_err(|_| {
                Error::Data(format!("line {line}, well {well}: '{cell}' is not a reading"))
            })?;
            columns[slot].push(value);
        }
        if let Some(idx) = time_col {
            time_values.push(record.get(idx).unwrap_or("").to_string());
        }
    }

    let timepoints = columns.first().map(Vec::len).unwrap_or(0);
    if timepoints == 0 {
        return Err(Error::Data("raw readings contain no timepoints".to_string()));
    }
    info!(
        "Read {} timepoints for {} wells",
        timepoints,
        well_cols.len()
    );

    let mut readings = RawReadings::from_columns(
        well_cols
            .iter()
            .map(|&(_, well)| well)
            .zip(columns)
            .collect(),
    )?;
    readings.metadata = metadata;

    if time_col.is_some() {
        let elapsed: Option<Vec<f64>> = time_values.iter().map(|t| parse_elapsed_hms(t)).collect();
        match elapsed {
            Some(elapsed) => readings = readings.with_elapsed_seconds(elapsed)?,
            None => warn!("'{TIME_COLUMN}' column is not in HH:MM:SS format; recorded times unavailable"),
        }
    }

    Ok(readings)
}

/// Parses an elapsed time in `HH:MM:SS` form into seconds.
pub fn parse_elapsed_hms(value: &str) -> Option<f64> {
    let mut parts = value.trim().trim_matches('"').split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

/// Decodes UTF-8 or UTF-16 (LE/BE, detected by BOM or by zero bytes) text.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    let (utf16, payload) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (Some(true), rest),
        [0xFE, 0xFF, rest @ ..] => (Some(false), rest),
        [0xEF, 0xBB, 0xBF, rest @ ..] => (None, rest),
        [a, 0, ..] if *a != 0 => (Some(true), bytes),
        [0, b, ..] if *b != 0 => (Some(false), bytes),
        _ => (None, bytes),
    };

    match utf16 {
        None => String::from_utf8(payload.to_vec())
            .map_err(|e| Error::Data(format!("input is not valid UTF-8: {e}"))),
        Some(_) if payload.len() % 2 != 0 => Err(Error::Data(format!(
            "UTF-16 input has an odd number of bytes ({})",
            payload.len()
        ))),
        Some(little_endian) => {
            let units: Vec<u16> = payload
                .chunks_exact(2)
                .map(|pair| {
                    if little_endian {
                        u16::from_le_bytes([pair[0], pair[1]])
                    } else {
                        u16::from_be_bytes([pair[0], pair[1]])
                    }
                })
                .collect();
            String::from_utf16(&units).map_err(|e| Error::Data(format!("input is not valid UTF-16: {e}")))
        }
    }
}

fn first_field(line: &str, delimiter: u8) -> &str {
    line.split(char::from(delimiter))
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
}

fn parse_preamble(lines: &[&str], delimiter: u8) -> FileMetadata {
    let mut metadata = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .from_reader(trimmed.as_bytes());
        if let Some(Ok(record)) = rdr.records().next() {
            if record.len() >= 2 {
                let key = record.get(0).unwrap_or("").trim().trim_matches('"').to_string();
                let value = record.get(1).unwrap_or("").trim().trim_matches('"').to_string();
                if !key.is_empty() {
                    metadata.push((key, value));
                }
            }
        }
    }
    metadata
}
