use crate::pipeline::types::{CountyFips, ElectionRecord, RawElectionRow};
use tracing::debug;

/// Cleans the raw election rows into two-party shares keyed by a
/// normalized county code. Rows without a usable two-party split are
/// discarded.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn clean_election(rows: Vec<RawElectionRow>) -> Vec<ElectionRecord> {
    let total = rows.len();

    let records: Vec<ElectionRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let fips = normalize_fips(row.county_fips);
            let (republican_share, democratic_share) = two_party_shares(row.per_gop, row.per_dem)?;
            Some(ElectionRecord {
                fips,
                republican_share,
                democratic_share,
            })
        })
        .collect();

    debug!(
        kept = records.len(),
        dropped = total - records.len(),
        "Cleaned election rows"
    );

    records
}

/// Truncates a numeric county code to an integer and zero-pads it to five
/// digits. Missing codes become [`CountyFips::UNKNOWN`]. Padding only ever
/// widens: codes above 99999 keep every digit and negative codes keep their
/// sign (`-1` becomes `-0001`), so only codes in `0..=99999` yield five digits.
pub fn normalize_fips(raw: Option<f64>) -> CountyFips {
    match raw {
        Some(code) if code.is_finite() => CountyFips::new(format!("{:05}", code.trunc() as i64)),
        _ => CountyFips::unknown(),
    }
}

/// Republican and democratic shares of the two-party vote. Returns `None`
/// when an input is missing or the two-party total is zero.
pub fn two_party_shares(gop: Option<f64>, dem: Option<f64>) -> Option<(f64, f64)> {
    let (gop, dem) = (gop?, dem?);
    let total = gop + dem;
    if total == 0.0 || !total.is_finite() {
        return None;
    }
    Some((gop / total, dem / total))
}
