// tests/pipeline_test.rs

use std::fs;

use growth_curves::{
    read_raw_readings, render, render_per_group, summarize, Error, OutputFormat, PlateConfig,
    ReaderOptions, RenderOptions, SampleLayout, SeriesKey, SummaryTable, TimeAxis, TimeUnit,
    WellAssignment,
};
use tempfile::tempdir;

const RAW_EXPORT: &str = "\
Reader,Bioscreen C
Experiment,pipeline
Time,1,2,3,4,5,6,7,8
00:00:00,0.10,0.12,0.50,0.54,0.30,0.34,0.20,0.22
00:30:00,0.20,0.22,0.80,0.84,0.40,0.44,0.30,0.32
01:00:00,0.20,0.22,0.90,0.94,0.60,0.64,0.50,0.52
";

const CONFIG: &str = "\
# group\tsample\twells
LB\tblank\t1-2
LB\tStrain1\t3,4
M9\tWT\t5-6
M9\tKO\t7-8
";

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_summarize_write_and_reload() {
    let dir = tempdir().unwrap();
    let raw_path = dir.path().join("plate.csv");
    let config_path = dir.path().join("plate.tsv");
    let summary_path = dir.path().join("plate_summary.tsv");
    fs::write(&raw_path, RAW_EXPORT).unwrap();
    fs::write(&config_path, CONFIG).unwrap();

    let config = PlateConfig::from_file(&config_path).unwrap();
    let readings = read_raw_readings(&raw_path, &ReaderOptions::default()).unwrap();
    assert_eq!(readings.metadata()[0], ("Reader".to_string(), "Bioscreen C".to_string()));

    let table = summarize(&readings, &config, &TimeAxis::Recorded(TimeUnit::Hours)).unwrap();
    assert_eq!(table.time(), &[0.0, 0.5, 1.0]);

    let keys: Vec<String> = table.series().iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["LB__Strain1", "M9__WT", "M9__KO"]);

    let strain = table.get(&SeriesKey::new("LB", "Strain1")).unwrap();
    assert!(approx(strain[0], 0.41));
    assert!(approx(strain[1], 0.61));
    assert!(approx(strain[2], 0.71));

    let wt = table.get(&SeriesKey::new("M9", "WT")).unwrap();
    assert!(approx(wt[2], 0.62));

    table.write_tsv(&summary_path).unwrap();
    let reloaded = SummaryTable::read_tsv(&summary_path).unwrap();
    assert_eq!(reloaded, table);
}

#[test]
fn test_interval_axis_ignores_recorded_times() {
    let config = PlateConfig::from_text(CONFIG).unwrap();
    let dir = tempdir().unwrap();
    let raw_path = dir.path().join("plate.csv");
    fs::write(&raw_path, RAW_EXPORT).unwrap();
    let readings = read_raw_readings(&raw_path, &ReaderOptions::default()).unwrap();

    let axis = TimeAxis::Interval {
        unit: TimeUnit::Minutes,
        interval_minutes: 20.0,
    };
    let table = summarize(&readings, &config, &axis).unwrap();
    assert_eq!(table.time(), &[0.0, 20.0, 40.0]);
}

#[test]
fn test_generated_layout_uses_consecutive_well_blocks() {
    let mut config = PlateConfig::new();
    config
        .load_from_lists(
            &["LB", "M9"],
            &SampleLayout::Shared(vec!["blank".to_string(), "WT".to_string()]),
            &WellAssignment::Replicates(2),
        )
        .unwrap();

    let m9 = config.group("M9").unwrap();
    assert_eq!(m9.blank().unwrap().wells, vec![5, 6]);
    assert_eq!(m9.sample("WT").unwrap().wells, vec![7, 8]);

    let dir = tempdir().unwrap();
    let raw_path = dir.path().join("plate.csv");
    fs::write(&raw_path, RAW_EXPORT).unwrap();
    let readings = read_raw_readings(&raw_path, &ReaderOptions::default()).unwrap();
    let table = summarize(&readings, &config, &TimeAxis::Recorded(TimeUnit::Hours)).unwrap();

    // LB: (0.50 + 0.54) / 2 - (0.10 + 0.12) / 2 at the first timepoint.
    let lb = table.get(&SeriesKey::new("LB", "WT")).unwrap();
    assert!(approx(lb[0], 0.41));
    // M9: (0.20 + 0.22) / 2 - (0.30 + 0.34) / 2.
    let m9 = table.get(&SeriesKey::new("M9", "WT")).unwrap();
    assert!(approx(m9[0], -0.11));
}

#[test]
fn test_config_referencing_absent_wells_fails() {
    let dir = tempdir().unwrap();
    let raw_path = dir.path().join("plate.csv");
    fs::write(&raw_path, RAW_EXPORT).unwrap();
    let readings = read_raw_readings(&raw_path, &ReaderOptions::default()).unwrap();

    let config = PlateConfig::from_text("LB\tWT\t9-12\n").unwrap();
    let result = summarize(&readings, &config, &TimeAxis::Recorded(TimeUnit::Hours));
    assert!(matches!(result, Err(Error::Data(_))));
}

#[test]
fn test_missing_input_files_are_io_errors() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    assert!(matches!(
        read_raw_readings(&missing, &ReaderOptions::default()),
        Err(Error::Io(_))
    ));
    assert!(matches!(PlateConfig::from_file(&missing), Err(Error::Io(_))));
    assert!(matches!(SummaryTable::read_tsv(&missing), Err(Error::Io(_))));
}

#[test]
fn test_render_rejects_unknown_extension_before_drawing() {
    let dir = tempdir().unwrap();
    let config = PlateConfig::from_text(CONFIG).unwrap();
    let raw_path = dir.path().join("plate.csv");
    fs::write(&raw_path, RAW_EXPORT).unwrap();
    let readings = read_raw_readings(&raw_path, &ReaderOptions::default()).unwrap();
    let table = summarize(&readings, &config, &TimeAxis::Recorded(TimeUnit::Hours)).unwrap();

    let result = render(&table, dir.path().join("chart.pdf"), &RenderOptions::default());
    assert!(matches!(result, Err(Error::Render(_))));
    assert!(!dir.path().join("chart.pdf").exists());
}

fn summarized_plate(dir: &std::path::Path) -> SummaryTable {
    let raw_path = dir.join("plate.csv");
    fs::write(&raw_path, RAW_EXPORT).unwrap();
    let readings = read_raw_readings(&raw_path, &ReaderOptions::default()).unwrap();
    let config = PlateConfig::from_text(CONFIG).unwrap();
    summarize(&readings, &config, &TimeAxis::Recorded(TimeUnit::Hours)).unwrap()
}

fn assert_non_empty_file(path: &std::path::Path) {
    let metadata = fs::metadata(path)
        .unwrap_or_else(|e| panic!("'{}' was not written: {e}", path.display()));
    assert!(metadata.len() > 0, "'{}' is empty", path.display());
}

#[test]
fn test_render_writes_bitmap_and_svg_charts() {
    let dir = tempdir().unwrap();
    let table = summarized_plate(dir.path());
    let options = RenderOptions {
        title: Some("Plate 1".to_string()),
        end_labels: true,
        marker_size: 4,
        ..Default::default()
    };

    let png = dir.path().join("chart.png");
    render(&table, &png, &options).unwrap();
    assert_non_empty_file(&png);

    let svg = dir.path().join("chart.svg");
    render(&table, &svg, &options).unwrap();
    assert_non_empty_file(&svg);
    let text = fs::read_to_string(&svg).unwrap();
    assert!(text.contains("<svg"));
    assert!(text.contains("LB__Strain1"));
}

#[test]
fn test_render_forced_format_replaces_extension() {
    let dir = tempdir().unwrap();
    let table = summarized_plate(dir.path());
    let options = RenderOptions {
        format: Some(OutputFormat::Svg),
        legend: false,
        marker_size: 0,
        ..Default::default()
    };

    render(&table, dir.path().join("chart.png"), &options).unwrap();
    assert_non_empty_file(&dir.path().join("chart.svg"));
    assert!(!dir.path().join("chart.png").exists());
}

#[test]
fn test_render_per_group_names_one_file_per_group() {
    let dir = tempdir().unwrap();
    let table = summarized_plate(dir.path());

    render_per_group(&table, dir.path().join("g"), &RenderOptions::default()).unwrap();
    assert_non_empty_file(&dir.path().join("g.LB.png"));
    assert_non_empty_file(&dir.path().join("g.M9.png"));

    let only_m9 = RenderOptions {
        groups: Some(vec!["M9".to_string()]),
        format: Some(OutputFormat::Svg),
        ..Default::default()
    };
    render_per_group(&table, dir.path().join("m9"), &only_m9).unwrap();
    assert_non_empty_file(&dir.path().join("m9.M9.svg"));
    assert!(!dir.path().join("m9.LB.svg").exists());
}

#[test]
fn test_render_per_group_replaces_slash_in_group_label() {
    let dir = tempdir().unwrap();
    let mut table = SummaryTable::new(vec![0.0, 0.5, 1.0]);
    table
        .push_series(SeriesKey::new("M9/glc", "WT"), vec![0.05, 0.2, 0.6])
        .unwrap();

    render_per_group(&table, dir.path().join("g"), &RenderOptions::default()).unwrap();
    assert_non_empty_file(&dir.path().join("g.M9_glc.png"));
}
