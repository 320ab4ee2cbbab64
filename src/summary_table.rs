// src/summary_table.rs

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use log::info;

use crate::constants::{KEY_SEPARATOR, TIME_COLUMN};
use crate::error::{Error, Result};

/// Identifies one summary series as a (group, sample) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub group: String,
    pub sample: String,
}

impl SeriesKey {
    pub fn new(group: impl Into<String>, sample: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            sample: sample.into(),
        }
    }

    /// Splits a `Group__Sample` column name on its first separator.
    pub fn parse(column: &str) -> Result<Self> {
        match column.split_once(KEY_SEPARATOR) {
            Some((group, sample)) if !group.is_empty() && !sample.is_empty() => {
                Ok(Self::new(group, sample))
            }
            _ => Err(Error::Parse(format!(
                "column '{column}' is not of the form Group{KEY_SEPARATOR}Sample"
            ))),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.group, KEY_SEPARATOR, self.sample)
    }
}

/// Averaged (and blank-corrected) series sharing one time column.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    time: Vec<f64>,
    series: Vec<(SeriesKey, Vec<f64>)>,
}

impl SummaryTable {
    pub fn new(time: Vec<f64>) -> Self {
        Self {
            time,
            series: Vec::new(),
        }
    }

    /// Appends a series; it must have one value per timepoint and a new key.
    pub fn push_series(&mut self, key: SeriesKey, values: Vec<f64>) -> Result<()> {
        if values.len() != self.time.len() {
            return Err(Error::Data(format!(
                "series '{key}' has {} values for {} timepoints",
                values.len(),
                self.time.len()
            )));
        }
        if self.get(&key).is_some() {
            return Err(Error::Config(format!("series '{key}' is already present")));
        }
        self.series.push((key, values));
        Ok(())
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn series(&self) -> &[(SeriesKey, Vec<f64>)] {
        &self.series
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Group labels in the order their first series appears.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for (key, _) in &self.series {
            if !groups.contains(&key.group) {
                groups.push(key.group.clone());
            }
        }
        groups
    }

    /// Number of timepoints.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// True when there is nothing to plot: no series or no timepoints.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty() || self.time.is_empty()
    }

    /// Copy restricted to the given groups, plus the requested groups that were not found.
    pub fn filter_groups(&self, groups: &[String]) -> (SummaryTable, Vec<String>) {
        self.filter_by(groups, |key| key.group.clone())
    }

    /// Copy restricted to the given `Group__Sample` keys, plus the keys that were not found.
    pub fn filter_samples(&self, samples: &[String]) -> (SummaryTable, Vec<String>) {
        self.filter_by(samples, |key| key.to_string())
    }

    fn filter_by<F>(&self, wanted: &[String], name_of: F) -> (SummaryTable, Vec<String>)
    where
        F: Fn(&SeriesKey) -> String,
    {
        let series: Vec<(SeriesKey, Vec<f64>)> = self
            .series
            .iter()
            .filter(|(key, _)| wanted.contains(&name_of(key)))
            .cloned()
            .collect();
        let missing = wanted
            .iter()
            .filter(|name| !series.iter().any(|(key, _)| &name_of(key) == *name))
            .cloned()
            .collect();
        (
            SummaryTable {
                time: self.time.clone(),
                series,
            },
            missing,
        )
    }

    /// Writes the table as tab-separated text.
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        info!(
            "Summary of {} series x {} timepoints written to '{}'",
            self.series.len(),
            self.time.len(),
            path.display()
        );
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(writer);

        let mut header = vec![TIME_COLUMN.to_string()];
        header.extend(self.series.iter().map(|(key, _)| key.to_string()));
        wtr.write_record(&header)?;

        for (row, t) in self.time.iter().enumerate() {
            let mut record = Vec::with_capacity(self.series.len() + 1);
            record.push(t.to_string());
            record.extend(self.series.iter().map(|(_, values)| values[row].to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Loads a previously written summary; no raw data or configuration is needed.
    pub fn read_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        match headers.get(0) {
            Some(first) if first == TIME_COLUMN => {}
            other => {
                return Err(Error::Parse(format!(
                    "summary header must start with '{TIME_COLUMN}', found {:?}",
                    other.unwrap_or("")
                )))
            }
        }
        let keys: Vec<SeriesKey> = headers
            .iter()
            .skip(1)
            .map(SeriesKey::parse)
            .collect::<Result<_>>()?;

        let mut time = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); keys.len()];
        for (row_index, result) in rdr.records().enumerate() {
            let record = result?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            if record.len() != headers.len() {
                return Err(Error::Parse(format!(
                    "row {} has {} fields, expected {}",
                    row_index + 1,
                    record.len(),
                    headers.len()
                )));
            }
            time.push(parse_cell(&record[0], row_index, TIME_COLUMN)?);
            for (col, column) in columns.iter_mut().enumerate() {
                column.push(parse_cell(&record[col + 1], row_index, &headers[col + 1])?);
            }
        }

        let mut table = SummaryTable::new(time);
        for (key, values) in keys.into_iter().zip(columns) {
            table.push_series(key, values)?;
        }
        Ok(table)
    }
}

fn parse_cell(cell: &str, row_index: usize, column: &str) -> Result<f64> {
    cell.parse::<f64>().map_err(|_| {
        Error::Parse(format!(
            "row {}, column '{column}': '{cell}' is not a number",
            row_index + 1
        ))
    })
}
