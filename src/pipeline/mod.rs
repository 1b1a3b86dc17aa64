//! Election/vaccination cleaning, joining, and smoothing.
//!
//! The stages run strictly in order: each takes ownership of the previous
//! stage's output and hands its own result to the next.

pub mod aggregate;
pub mod election;
pub mod smooth;
pub mod types;
pub mod utility;
pub mod vaccination;

use crate::loader::{load_election, load_vaccinations};
use anyhow::Result;
use std::path::Path;
use tracing::info;
use types::PivotTable;

/// Pivoted rates before and after smoothing.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub raw: PivotTable,
    pub smoothed: PivotTable,
}

/// Loads both tables and runs them through clean, join, aggregate, pivot,
/// and smooth.
///
/// # Errors
///
/// Fails on any unreadable file, missing column, unparsable value, or
/// malformed date.
#[tracing::instrument]
pub fn run(election_path: &Path, vaccination_path: &Path) -> Result<PipelineOutput> {
    let election = election::clean_election(load_election(election_path)?);
    let vaccinations = vaccination::clean_vaccinations(load_vaccinations(vaccination_path)?)?;

    let raw = build_pivot(&vaccinations, &election)?;
    info!(dates = raw.len(), bins = raw.bins().len(), "Pivoted rates");

    let smoothed = smooth::smooth(raw.clone(), smooth::WINDOW);
    info!(dates = smoothed.len(), "Smoothed rates");

    Ok(PipelineOutput { raw, smoothed })
}

/// Joins cleaned rows and pivots the per-(date, bin) rates.
pub fn build_pivot(
    vaccinations: &[types::VaccinationRecord],
    election: &[types::ElectionRecord],
) -> Result<PivotTable> {
    let joined = aggregate::join(vaccinations, election);
    let groups = aggregate::aggregate(&joined);
    aggregate::pivot(&groups)
}
