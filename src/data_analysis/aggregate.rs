// src/data_analysis/aggregate.rs

use log::{debug, info};
use ndarray::{Array1, Axis};

use crate::data_analysis::time_axis::TimeAxis;
use crate::data_input::plate_config::{PlateConfig, SampleSpec};
use crate::data_input::raw_readings::RawReadings;
use crate::error::{Error, Result};
use crate::summary_table::{SeriesKey, SummaryTable};

/// Averages each sample's wells per timepoint and subtracts the group's blank.
///
/// Groups with a `blank` sample have the blank mean subtracted from every
/// other sample at each timepoint; the blank itself is not emitted. Groups
/// without a blank are emitted as plain means. Columns follow the
/// configuration's group and sample order.
pub fn summarize(raw: &RawReadings, config: &PlateConfig, time_axis: &TimeAxis) -> Result<SummaryTable> {
    if config.is_empty() {
        return Err(Error::Config("configuration has no groups".to_string()));
    }
    config.validate()?;

    let timepoints = raw.timepoint_count();
    if timepoints == 0 {
        return Err(Error::Data("raw readings contain no timepoints".to_string()));
    }
    let time = time_axis.timepoints(timepoints, raw.elapsed_seconds())?;

    let mut table = SummaryTable::new(time);
    for group in config.groups() {
        let blank_mean = match group.blank() {
            Some(blank) => Some(sample_mean(raw, &group.label, blank)?),
            None => None,
        };
        if blank_mean.is_none() {
            debug!("Group '{}' has no blank; emitting raw means", group.label);
        }

        for sample in group.samples.iter().filter(|s| !s.is_blank()) {
            let mut mean = sample_mean(raw, &group.label, sample)?;
            if let Some(blank) = &blank_mean {
                mean -= blank;
            }
            table.push_series(SeriesKey::new(&group.label, &sample.name), mean.to_vec())?;
        }
    }

    info!(
        "Summarized {} series over {} timepoints",
        table.series().len(),
        timepoints
    );
    Ok(table)
}

/// Per-timepoint arithmetic mean across the sample's wells.
fn sample_mean(raw: &RawReadings, group: &str, sample: &SampleSpec) -> Result<Array1<f64>> {
    if sample.wells.is_empty() {
        return Err(Error::Data(format!(
            "sample '{}' in group '{group}' has no wells",
            sample.name
        )));
    }

    let columns = sample
        .wells
        .iter()
        .map(|&well| {
            raw.column_of(well).ok_or_else(|| {
                Error::Data(format!(
                    "well {well} (group '{group}', sample '{}') is not in the raw readings",
                    sample.name
                ))
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    raw.values()
        .select(Axis(1), &columns)
        .mean_axis(Axis(1))
        .ok_or_else(|| Error::Data(format!("sample '{}' has no readings", sample.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_analysis::time_axis::TimeUnit;
    use crate::data_input::plate_config::SampleGroup;

    fn hourly() -> TimeAxis {
        TimeAxis::Interval {
            unit: TimeUnit::Hours,
            interval_minutes: 60.0,
        }
    }

    fn readings() -> RawReadings {
        RawReadings::from_columns(vec![
            (1, vec![0.10, 0.20]),
            (2, vec![0.12, 0.22]),
            (3, vec![0.50, 0.80]),
            (4, vec![0.54, 0.84]),
            (5, vec![0.30, 0.40]),
            (6, vec![0.34, 0.44]),
        ])
        .unwrap()
    }

    #[test]
    fn test_blank_is_subtracted_and_consumed() {
        let config = PlateConfig::from_text("LB\tblank\t1-2\nLB\tStrain1\t3-4\n").unwrap();
        let table = summarize(&readings(), &config, &hourly()).unwrap();

        assert_eq!(table.series().len(), 1);
        let strain = table.get(&SeriesKey::new("LB", "Strain1")).unwrap();
        assert!((strain[0] - 0.41).abs() < 1e-12);
        assert!((strain[1] - 0.61).abs() < 1e-12);
        assert!(table.get(&SeriesKey::new("LB", "blank")).is_none());
        assert_eq!(table.time(), &[0.0, 1.0]);
    }

    #[test]
    fn test_group_without_blank_is_plain_mean() {
        let config = PlateConfig::from_text("M9\tWT\t5,6\nM9\tKO\t3\n").unwrap();
        let table = summarize(&readings(), &config, &hourly()).unwrap();

        let wt = table.get(&SeriesKey::new("M9", "WT")).unwrap();
        assert!((wt[0] - 0.32).abs() < 1e-12);
        assert!((wt[1] - 0.42).abs() < 1e-12);
        assert_eq!(table.get(&SeriesKey::new("M9", "KO")).unwrap(), &[0.50, 0.80]);
    }

    #[test]
    fn test_column_order_follows_configuration() {
        let config =
            PlateConfig::from_text("M9\tWT\t5\nLB\tblank\t1\nLB\tB\t3\nLB\tA\t4\nM9\tKO\t6\n").unwrap();
        let table = summarize(&readings(), &config, &hourly()).unwrap();
        let keys: Vec<String> = table.series().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["M9__WT", "M9__KO", "LB__B", "LB__A"]);
    }

    #[test]
    fn test_missing_well_is_data_error() {
        let config = PlateConfig::from_text("LB\tWT\t5-9\n").unwrap();
        assert!(matches!(
            summarize(&readings(), &config, &hourly()),
            Err(Error::Data(_))
        ));
    }

    #[test]
    fn test_missing_blank_well_is_data_error() {
        let config = PlateConfig::from_text("LB\tblank\t40\nLB\tWT\t1\n").unwrap();
        assert!(matches!(
            summarize(&readings(), &config, &hourly()),
            Err(Error::Data(_))
        ));
    }

    #[test]
    fn test_empty_configuration_is_config_error() {
        assert!(matches!(
            summarize(&readings(), &PlateConfig::new(), &hourly()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_time_axis_errors_surface_before_averaging() {
        let mut config = PlateConfig::new();
        config
            .set_manual(vec![SampleGroup::new("LB").with_sample("WT", vec![99])])
            .unwrap();
        let err = summarize(&readings(), &config, &TimeAxis::Explicit(vec![0.0])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
