//! CSV loader for the election and vaccination tables.

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::pipeline::types::{RawElectionRow, RawVaccinationRow};

/// Columns the election cleaner reads.
pub const ELECTION_COLUMNS: &[&str] = &["county_fips", "per_gop", "per_dem"];

/// Columns the vaccination cleaner reads.
pub const VACCINATION_COLUMNS: &[&str] = &[
    "Date",
    "FIPS",
    "Series_Complete_Yes",
    "Series_Complete_Pop_Pct",
];

/// Reads every row of a headed CSV file into `T`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, if any of `required`
/// is missing from the header, or if a row fails to deserialize.
pub fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(file);

    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();
    require_columns(&headers, required).with_context(|| path.display().to_string())?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result.with_context(|| format!("parsing {}", path.display()))?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "Loaded table");
    Ok(rows)
}

fn require_columns(headers: &StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();

    if !missing.is_empty() {
        bail!("missing required column(s): {}", missing.join(", "));
    }
    Ok(())
}

/// Loads the county presidential results table.
#[tracing::instrument]
pub fn load_election(path: &Path) -> Result<Vec<RawElectionRow>> {
    read_table(path, ELECTION_COLUMNS)
}

/// Loads the county vaccination table.
#[tracing::instrument]
pub fn load_vaccinations(path: &Path) -> Result<Vec<RawVaccinationRow>> {
    read_table(path, VACCINATION_COLUMNS)
}
