// src/data_analysis/time_axis.rs

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Unit of the summary time column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Converts a duration in minutes into this unit.
    pub fn from_minutes(self, minutes: f64) -> f64 {
        match self {
            TimeUnit::Minutes => minutes,
            TimeUnit::Hours => minutes / 60.0,
            TimeUnit::Days => minutes / (60.0 * 24.0),
        }
    }

    /// Default x-axis description for charts in this unit.
    pub fn axis_label(self) -> &'static str {
        match self {
            TimeUnit::Minutes => "Time (min)",
            TimeUnit::Hours => "Time (h)",
            TimeUnit::Days => "Time (d)",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutes" | "minute" | "min" | "mins" | "m" => Ok(TimeUnit::Minutes),
            "hours" | "hour" | "h" => Ok(TimeUnit::Hours),
            "days" | "day" | "d" => Ok(TimeUnit::Days),
            other => Err(Error::Config(format!(
                "unknown time unit '{other}' (expected minutes, hours or days)"
            ))),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        };
        f.write_str(name)
    }
}

/// How the summary time column is produced from N raw timepoints.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    /// `index * interval_minutes`, expressed in `unit`.
    Interval { unit: TimeUnit, interval_minutes: f64 },
    /// Elapsed times recorded in the raw export, expressed in `unit`.
    Recorded(TimeUnit),
    /// Caller-supplied values, one per timepoint.
    Explicit(Vec<f64>),
}

impl TimeAxis {
    /// Unit of the produced column; `None` for caller-supplied values.
    pub fn unit(&self) -> Option<TimeUnit> {
        match self {
            TimeAxis::Interval { unit, .. } | TimeAxis::Recorded(unit) => Some(*unit),
            TimeAxis::Explicit(_) => None,
        }
    }

    /// Builds the time column for `count` timepoints.
    ///
    /// `recorded_seconds` is only consulted for [`TimeAxis::Recorded`].
    pub fn timepoints(&self, count: usize, recorded_seconds: Option<&[f64]>) -> Result<Vec<f64>> {
        match self {
            TimeAxis::Interval {
                unit,
                interval_minutes,
            } => {
                if !interval_minutes.is_finite() || *interval_minutes <= 0.0 {
                    return Err(Error::Config(format!(
                        "sampling interval must be a positive number of minutes, got {interval_minutes}"
                    )));
                }
                Ok((0..count)
                    .map(|i| unit.from_minutes(i as f64 * interval_minutes))
                    .collect())
            }
            TimeAxis::Recorded(unit) => {
                let seconds = recorded_seconds.ok_or_else(|| {
                    Error::Data("raw readings carry no recorded time column".to_string())
                })?;
                if seconds.len() != count {
                    return Err(Error::Data(format!(
                        "{} recorded times for {count} timepoints",
                        seconds.len()
                    )));
                }
                Ok(seconds.iter().map(|s| unit.from_minutes(s / 60.0)).collect())
            }
            TimeAxis::Explicit(values) => {
                if values.len() != count {
                    return Err(Error::Config(format!(
                        "{} timepoints supplied but the data has {count}",
                        values.len()
                    )));
                }
                Ok(values.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_in_hours() {
        let axis = TimeAxis::Interval {
            unit: TimeUnit::Hours,
            interval_minutes: 20.0,
        };
        let time = axis.timepoints(4, None).unwrap();
        assert_eq!(time[3], 1.0);
        assert_eq!(time[0], 0.0);
    }

    #[test]
    fn test_interval_in_minutes_and_days() {
        let minutes = TimeAxis::Interval {
            unit: TimeUnit::Minutes,
            interval_minutes: 15.0,
        };
        assert_eq!(minutes.timepoints(3, None).unwrap(), vec![0.0, 15.0, 30.0]);

        let days = TimeAxis::Interval {
            unit: TimeUnit::Days,
            interval_minutes: 720.0,
        };
        assert_eq!(days.timepoints(3, None).unwrap(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_invalid_interval() {
        let axis = TimeAxis::Interval {
            unit: TimeUnit::Hours,
            interval_minutes: 0.0,
        };
        assert!(matches!(axis.timepoints(2, None), Err(Error::Config(_))));
    }

    #[test]
    fn test_recorded_time() {
        let axis = TimeAxis::Recorded(TimeUnit::Hours);
        let time = axis.timepoints(2, Some(&[0.0, 5400.0])).unwrap();
        assert_eq!(time, vec![0.0, 1.5]);
        assert!(matches!(axis.timepoints(2, None), Err(Error::Data(_))));
    }

    #[test]
    fn test_explicit_length_must_match() {
        let axis = TimeAxis::Explicit(vec![0.0, 2.0, 4.0]);
        assert_eq!(axis.timepoints(3, None).unwrap(), vec![0.0, 2.0, 4.0]);
        assert!(matches!(axis.timepoints(4, None), Err(Error::Config(_))));
    }

    #[test]
    fn test_axis_unit() {
        let interval = TimeAxis::Interval {
            unit: TimeUnit::Minutes,
            interval_minutes: 10.0,
        };
        assert_eq!(interval.unit(), Some(TimeUnit::Minutes));
        assert_eq!(TimeAxis::Recorded(TimeUnit::Days).unit(), Some(TimeUnit::Days));
        assert_eq!(TimeAxis::Explicit(vec![0.0]).unit(), None);
        assert_eq!(TimeUnit::Minutes.axis_label(), "Time (min)");
    }

    #[test]
    fn test_unit_aliases() {
        assert_eq!("H".parse::<TimeUnit>().unwrap(), TimeUnit::Hours);
        assert_eq!("mins".parse::<TimeUnit>().unwrap(), TimeUnit::Minutes);
        assert_eq!("day".parse::<TimeUnit>().unwrap(), TimeUnit::Days);
        assert!(matches!("weeks".parse::<TimeUnit>(), Err(Error::Config(_))));
    }
}
