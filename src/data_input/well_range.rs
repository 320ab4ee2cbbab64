// src/data_input/well_range.rs

use crate::error::{Error, Result};
use crate::types::Well;

/// Returns the inclusive run of wells `start..=stop`.
pub(crate) fn well_range(start: Well, stop: Well) -> Vec<Well> {
    (start..=stop).collect()
}

/// Parses a compact well token into explicit well indices.
///
/// Two forms are accepted:
/// * `"a-b"`: inclusive ascending range, `a <= b`
/// * `"a,b,c"`: explicit list, order preserved (a single number is a one-item list)
///
/// Wells are 1-based, so `0` is rejected along with non-numeric items.
pub fn parse_well_range(token: &str) -> Result<Vec<Well>> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Parse("empty well token".to_string()));
    }

    if let Some((start, stop)) = token.split_once('-') {
        let start = parse_well(start, token)?;
        let stop = parse_well(stop, token)?;
        if start > stop {
            return Err(Error::Parse(format!(
                "well range '{token}' starts after it stops ({start} > {stop})"
            )));
        }
        return Ok(well_range(start, stop));
    }

    token
        .split(',')
        .map(|item| parse_well(item, token))
        .collect()
}

fn parse_well(item: &str, token: &str) -> Result<Well> {
    let item = item.trim();
    let well: Well = item
        .parse()
        .map_err(|_| Error::Parse(format!("'{item}' in well token '{token}' is not a well number")))?;
    if well == 0 {
        return Err(Error::Parse(format!(
            "well token '{token}' contains well 0 (wells are numbered from 1)"
        )));
    }
    Ok(well)
}
