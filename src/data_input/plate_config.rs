// src/data_input/plate_config.rs

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use log::{debug, info};

use crate::constants::{BLANK_SAMPLE, DEFAULT_REPLICATES};
use crate::data_input::well_range::{parse_well_range, well_range};
use crate::error::{Error, Result};
use crate::types::Well;

/// A named sample and the wells it was grown in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSpec {
    pub name: String,
    pub wells: Vec<Well>,
}

impl SampleSpec {
    pub fn new(name: impl Into<String>, wells: Vec<Well>) -> Self {
        Self {
            name: name.into(),
            wells,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name == BLANK_SAMPLE
    }
}

/// One experimental condition: a label plus its samples in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleGroup {
    pub label: String,
    pub samples: Vec<SampleSpec>,
}

impl SampleGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            samples: Vec::new(),
        }
    }

    /// Builder-style helper for assembling groups by hand.
    pub fn with_sample(mut self, name: impl Into<String>, wells: Vec<Well>) -> Self {
        self.samples.push(SampleSpec::new(name, wells));
        self
    }

    pub fn sample(&self, name: &str) -> Option<&SampleSpec> {
        self.samples.iter().find(|s| s.name == name)
    }

    /// The group's background reference, if it has one.
    pub fn blank(&self) -> Option<&SampleSpec> {
        self.samples.iter().find(|s| s.is_blank())
    }
}

/// How sample names are laid out across groups for [`PlateConfig::load_from_lists`].
#[derive(Debug, Clone)]
pub enum SampleLayout {
    /// The same sample list is repeated for every group.
    Shared(Vec<String>),
    /// One sample list per group, in group order.
    PerGroup(Vec<Vec<String>>),
}

/// Where the wells come from for [`PlateConfig::load_from_lists`].
#[derive(Debug, Clone)]
pub enum WellAssignment {
    /// Consecutive blocks of this many wells, group-major then sample order, starting at well 1.
    Replicates(u32),
    /// One well list per (group, sample) pair, in the same order.
    Explicit(Vec<Vec<Well>>),
}

impl Default for WellAssignment {
    fn default() -> Self {
        WellAssignment::Replicates(DEFAULT_REPLICATES)
    }
}

/// Replaces characters outside `[A-Za-z0-9_-./]` with `_`, trims leading and
/// trailing underscores and collapses runs of them, so that a cleaned name
/// never contains the `__` key separator.
pub fn sanitize_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.chars() {
        let ch = if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | '/') {
            ch
        } else {
            '_'
        };
        if ch == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(ch);
    }
    cleaned.trim_matches('_').to_string()
}

/// Ordered group → sample → wells description of a plate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateConfig {
    groups: Vec<SampleGroup>,
}

impl PlateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[SampleGroup] {
        &self.groups
    }

    pub fn group(&self, label: &str) -> Option<&SampleGroup> {
        self.groups.iter().find(|g| g.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Parses a configuration file (see [`PlateConfig::load_from_text`]).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        let mut config = Self::new();
        config.load_from_text(text)?;
        Ok(config)
    }

    /// Replaces the configuration with tab-delimited `group<TAB>sample<TAB>wells` rows.
    ///
    /// Blank lines and `#` comments are skipped. A group seen again later keeps
    /// its first position and receives the new sample. The model is unchanged
    /// if any row fails.
    pub fn load_from_text(&mut self, text: &str) -> Result<()> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes());

        let mut groups: Vec<SampleGroup> = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            if record.len() != 3 {
                return Err(Error::Config(format!(
                    "line {line}: expected 3 tab-separated fields (group, sample, wells), found {}",
                    record.len()
                )));
            }

            let group_label = clean_name(&record[0], "group")?;
            let sample_name = clean_name(&record[1], "sample")?;
            let wells = parse_well_range(&record[2])?;

            let idx = match groups.iter().position(|g| g.label == group_label) {
                Some(idx) => idx,
                None => {
                    groups.push(SampleGroup::new(group_label.clone()));
                    groups.len() - 1
                }
            };
            let group = &mut groups[idx];
            if group.sample(&sample_name).is_some() {
                return Err(Error::Config(format!(
                    "line {line}: duplicate sample '{sample_name}' in group '{group_label}'"
                )));
            }
            debug!("Config line {line}: {group_label}/{sample_name} -> wells {wells:?}");
            group.samples.push(SampleSpec::new(sample_name, wells));
        }

        validate_groups(&groups)?;
        info!("Loaded configuration with {} groups", groups.len());
        self.groups = groups;
        Ok(())
    }

    /// Replaces the configuration with the cartesian expansion of group and sample names.
    ///
    /// Without explicit wells, every (group, sample) pair is given the next
    /// block of `n` consecutive wells, e.g. groups `[LB, M9]` with samples
    /// `[blank, WT]` and 4 replicates yield LB: blank 1-4, WT 5-8 and
    /// M9: blank 9-12, WT 13-16.
    pub fn load_from_lists(
        &mut self,
        groups: &[&str],
        layout: &SampleLayout,
        wells: &WellAssignment,
    ) -> Result<()> {
        let sample_lists: Vec<&[String]> = match layout {
            SampleLayout::Shared(samples) => vec![samples.as_slice(); groups.len()],
            SampleLayout::PerGroup(lists) => {
                if lists.len() != groups.len() {
                    return Err(Error::Config(format!(
                        "{} groups given but {} sample lists",
                        groups.len(),
                        lists.len()
                    )));
                }
                lists.iter().map(Vec::as_slice).collect()
            }
        };
        let pair_count: usize = sample_lists.iter().map(|s| s.len()).sum();

        let well_sets: Vec<Vec<Well>> = match wells {
            WellAssignment::Replicates(0) => {
                return Err(Error::Config("replicate count must be at least 1".to_string()));
            }
            WellAssignment::Replicates(n) => {
                let pairs = u32::try_from(pair_count)
                    .ok()
                    .filter(|pairs| pairs.checked_mul(*n).is_some())
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "{pair_count} group/sample pairs of {n} replicates exceed the well numbering"
                        ))
                    })?;
                (0..pairs)
                    .map(|i| well_range(i * *n + 1, (i + 1) * *n))
                    .collect()
            }
            WellAssignment::Explicit(lists) => {
                if lists.len() != pair_count {
                    return Err(Error::Config(format!(
                        "{} well lists given but {} group/sample pairs need wells",
                        lists.len(),
                        pair_count
                    )));
                }
                lists.clone()
            }
        };

        let mut well_sets = well_sets.into_iter();
        let mut built = Vec::with_capacity(groups.len());
        for (label, samples) in groups.iter().zip(sample_lists) {
            let mut group = SampleGroup::new(clean_name(label, "group")?);
            for sample in samples {
                let wells = well_sets.next().unwrap_or_default();
                group
                    .samples
                    .push(SampleSpec::new(clean_name(sample, "sample")?, wells));
            }
            built.push(group);
        }

        validate_groups(&built)?;
        self.groups = built;
        Ok(())
    }

    /// Replaces the configuration with caller-built groups.
    ///
    /// Names are cleaned and the structure validated; well lists are taken as given.
    pub fn set_manual(&mut self, entries: Vec<SampleGroup>) -> Result<()> {
        let mut built = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut group = SampleGroup::new(clean_name(&entry.label, "group")?);
            for sample in entry.samples {
                group
                    .samples
                    .push(SampleSpec::new(clean_name(&sample.name, "sample")?, sample.wells));
            }
            built.push(group);
        }
        validate_groups(&built)?;
        self.groups = built;
        Ok(())
    }

    /// Checks the structural invariants of the current groups.
    pub fn validate(&self) -> Result<()> {
        validate_groups(&self.groups)
    }
}

fn clean_name(raw: &str, what: &str) -> Result<String> {
    let cleaned = sanitize_name(raw);
    if cleaned.is_empty() {
        return Err(Error::Config(format!("{what} name '{raw}' is empty after cleaning")));
    }
    Ok(cleaned)
}

fn validate_groups(groups: &[SampleGroup]) -> Result<()> {
    let mut labels = HashSet::new();
    for group in groups {
        if !labels.insert(group.label.as_str()) {
            return Err(Error::Config(format!(
                "group '{}' is defined more than once",
                group.label
            )));
        }
        if group.samples.is_empty() {
            return Err(Error::Config(format!("group '{}' has no samples", group.label)));
        }

        let mut names = HashSet::new();
        for sample in &group.samples {
            if !names.insert(sample.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate sample '{}' in group '{}'",
                    sample.name, group.label
                )));
            }
            if sample.wells.is_empty() {
                return Err(Error::Config(format!(
                    "sample '{}' in group '{}' has no wells",
                    sample.name, group.label
                )));
            }
            if sample.wells.contains(&0) {
                return Err(Error::Config(format!(
                    "sample '{}' in group '{}' references well 0 (wells are numbered from 1)",
                    sample.name, group.label
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("M9 glu!"), "M9_glu");
        assert_eq!(sanitize_name("__WT__1__"), "WT_1");
        assert_eq!(sanitize_name("LB-0.5/x"), "LB-0.5/x");
        assert_eq!(sanitize_name("%%%"), "");
        assert!(!sanitize_name("a  b  c").contains("__"));
    }

    #[test]
    fn test_load_from_text_keeps_encounter_order() {
        let text = "LB\tblank\t1-2\nLB\tStrain1\t3-4\nM9\tWT\t5,6\nLB\tStrain2\t7\n";
        let config = PlateConfig::from_text(text).unwrap();

        let labels: Vec<&str> = config.groups().iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["LB", "M9"]);

        let lb = config.group("LB").unwrap();
        let samples: Vec<&str> = lb.samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(samples, vec!["blank", "Strain1", "Strain2"]);
        assert_eq!(lb.blank().unwrap().wells, vec![1, 2]);
        assert_eq!(lb.sample("Strain2").unwrap().wells, vec![7]);
        assert_eq!(config.group("M9").unwrap().samples[0].wells, vec![5, 6]);
    }

    #[test]
    fn test_load_from_text_skips_comments_and_blank_lines() {
        let text = "# plate 1\n\nLB\tWT\t1-4\n";
        let config = PlateConfig::from_text(text).unwrap();
        assert_eq!(config.groups().len(), 1);
    }

    #[test]
    fn test_load_from_text_wrong_field_count() {
        let err = PlateConfig::from_text("LB\tWT\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = PlateConfig::from_text("LB\tWT\t1-4\textra\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_text_duplicate_pair() {
        let text = "LB\tWT\t1-4\nLB\tWT\t5-8\n";
        assert!(matches!(PlateConfig::from_text(text), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_text_bad_token_is_parse_error() {
        let text = "LB\tWT\t5-2\n";
        assert!(matches!(PlateConfig::from_text(text), Err(Error::Parse(_))));
    }

    #[test]
    fn test_failed_load_leaves_model_unchanged() {
        let mut config = PlateConfig::from_text("LB\tWT\t1-4\n").unwrap();
        let before = config.clone();
        assert!(config.load_from_text("M9\tWT\t1-4\nM9\tWT\t5-8\n").is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn test_load_from_lists_replicate_blocks() {
        let mut config = PlateConfig::new();
        config
            .load_from_lists(
                &["LB", "M9-glu"],
                &SampleLayout::Shared(names(&["blank", "WT", "mutant"])),
                &WellAssignment::default(),
            )
            .unwrap();

        let lb = config.group("LB").unwrap();
        assert_eq!(lb.sample("blank").unwrap().wells, vec![1, 2, 3, 4]);
        assert_eq!(lb.sample("WT").unwrap().wells, vec![5, 6, 7, 8]);
        assert_eq!(lb.sample("mutant").unwrap().wells, vec![9, 10, 11, 12]);
        let m9 = config.group("M9-glu").unwrap();
        assert_eq!(m9.sample("blank").unwrap().wells, vec![13, 14, 15, 16]);
        assert_eq!(m9.sample("mutant").unwrap().wells, vec![21, 22, 23, 24]);
    }

    #[test]
    fn test_load_from_lists_per_group_and_explicit_wells() {
        let mut config = PlateConfig::new();
        let layout = SampleLayout::PerGroup(vec![names(&["blank", "WT"]), names(&["KO"])]);
        let wells = WellAssignment::Explicit(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 9]]);
        config.load_from_lists(&["LB", "M9"], &layout, &wells).unwrap();

        assert_eq!(config.group("LB").unwrap().sample("WT").unwrap().wells, vec![4, 5, 6]);
        assert_eq!(config.group("M9").unwrap().sample("KO").unwrap().wells, vec![7, 9]);
    }

    #[test]
    fn test_load_from_lists_mismatches() {
        let mut config = PlateConfig::new();
        let layout = SampleLayout::PerGroup(vec![names(&["WT"])]);
        let err = config
            .load_from_lists(&["LB", "M9"], &layout, &WellAssignment::default())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let layout = SampleLayout::Shared(names(&["WT"]));
        let wells = WellAssignment::Explicit(vec![vec![1]]);
        let err = config.load_from_lists(&["LB", "M9"], &layout, &wells).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = config
            .load_from_lists(&["LB"], &layout, &WellAssignment::Replicates(0))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_lists_replicates_past_u32_is_config_error() {
        let mut config = PlateConfig::new();
        let layout = SampleLayout::Shared(names(&["blank", "WT"]));
        let wells = WellAssignment::Replicates(u32::MAX / 2 + 1);
        let err = config.load_from_lists(&["LB"], &layout, &wells).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(config.is_empty());
    }

    #[test]
    fn test_set_manual_validates_structure() {
        let mut config = PlateConfig::new();
        config
            .set_manual(vec![
                SampleGroup::new("LB").with_sample("blank", vec![1, 2]).with_sample("WT", vec![3, 4]),
                SampleGroup::new("M9 glu").with_sample("WT", vec![5]),
            ])
            .unwrap();
        assert!(config.group("M9_glu").is_some());

        let duplicate_groups = vec![
            SampleGroup::new("LB").with_sample("WT", vec![1]),
            SampleGroup::new("LB").with_sample("KO", vec![2]),
        ];
        assert!(matches!(config.set_manual(duplicate_groups), Err(Error::Config(_))));

        let duplicate_samples =
            vec![SampleGroup::new("LB").with_sample("WT", vec![1]).with_sample("WT", vec![2])];
        assert!(matches!(config.set_manual(duplicate_samples), Err(Error::Config(_))));

        let empty_wells = vec![SampleGroup::new("LB").with_sample("WT", vec![])];
        assert!(matches!(config.set_manual(empty_wells), Err(Error::Config(_))));
    }

    #[test]
    fn test_names_colliding_after_cleaning_are_duplicates() {
        let mut config = PlateConfig::new();
        let groups = vec![
            SampleGroup::new("M9 glu").with_sample("WT", vec![1]),
            SampleGroup::new("M9_glu").with_sample("WT", vec![2]),
        ];
        assert!(matches!(config.set_manual(groups), Err(Error::Config(_))));
    }
}
