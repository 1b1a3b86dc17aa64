use crate::pipeline::types::{
    Bin, CountyFips, ElectionRecord, GroupTotals, JoinedRecord, PivotTable, VaccinationRecord,
};
use crate::pipeline::utility::nan_sum;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

impl Bin {
    /// Rounds a democratic share to the nearest tenth. A pure 0.0 share
    /// lands in 0.1 and a pure 1.0 share in 0.9, so the end buckets merge
    /// into their neighbours. Shares outside `[0, 1]` have no bin.
    pub fn from_share(share: f64) -> Option<Self> {
        if !share.is_finite() {
            return None;
        }
        let tenths = match (share * 10.0).round_ties_even() as i64 {
            0 => Self::MIN_TENTHS,
            10 => Self::MAX_TENTHS,
            t @ 1..=9 => t as u8,
            _ => return None,
        };
        Self::from_tenths(tenths)
    }
}

/// Inner-joins vaccination rows to election rows on county code, keeping
/// the vaccination row order. A county repeated in the election table
/// yields one joined row per match.
#[tracing::instrument(skip_all, fields(vaccinations = vaccinations.len(), election = election.len()))]
pub fn join(vaccinations: &[VaccinationRecord], election: &[ElectionRecord]) -> Vec<JoinedRecord> {
    let mut by_fips: HashMap<&CountyFips, Vec<&ElectionRecord>> = HashMap::new();
    for record in election {
        by_fips.entry(&record.fips).or_default().push(record);
    }

    let mut unmatched = 0usize;
    let mut joined = Vec::new();

    for vax in vaccinations {
        let Some(matches) = by_fips.get(&vax.fips) else {
            unmatched += 1;
            continue;
        };
        for result in matches {
            joined.push(JoinedRecord {
                date: vax.date,
                fips: vax.fips.clone(),
                vaccinated_count: vax.vaccinated_count,
                vaccinated_rate: vax.vaccinated_rate,
                population: vax.population,
                republican_share: result.republican_share,
                democratic_share: result.democratic_share,
            });
        }
    }

    debug!(
        joined = joined.len(),
        unmatched_vaccination_rows = unmatched,
        "Joined vaccination and election rows"
    );

    joined
}

/// Sums vaccinated counts and populations per (date, bin). Missing and NaN
/// values contribute nothing to a sum.
#[tracing::instrument(skip_all, fields(rows = joined.len()))]
pub fn aggregate(joined: &[JoinedRecord]) -> BTreeMap<(NaiveDate, Bin), GroupTotals> {
    let mut groups: BTreeMap<(NaiveDate, Bin), GroupTotals> = BTreeMap::new();
    let mut unbinned = 0usize;

    for row in joined {
        let Some(bin) = Bin::from_share(row.democratic_share) else {
            unbinned += 1;
            continue;
        };

        let totals = groups.entry((row.date, bin)).or_default();
        totals.vaccinated = nan_sum([Some(totals.vaccinated), row.vaccinated_count]);
        totals.population = nan_sum([Some(totals.population), row.population]);
    }

    if unbinned > 0 {
        warn!(rows = unbinned, "Democratic share outside [0, 1], row skipped");
    }

    groups
}

/// Reshapes grouped totals into a date × bin matrix of rates. Dates and bins
/// with no filled cell are left out; unobserved (date, bin) pairs are missing.
///
/// # Errors
///
/// Only fails if the assembled matrix is inconsistent, which would be a bug.
pub fn pivot(groups: &BTreeMap<(NaiveDate, Bin), GroupTotals>) -> Result<PivotTable> {
    let rates: BTreeMap<(NaiveDate, Bin), f64> = groups
        .iter()
        .filter_map(|(key, totals)| Some((*key, totals.rate()?)))
        .collect();

    let dates: Vec<NaiveDate> = rates
        .keys()
        .map(|(date, _)| *date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let bins: Vec<Bin> = rates
        .keys()
        .map(|(_, bin)| *bin)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = dates
        .iter()
        .map(|date| {
            bins.iter()
                .map(|bin| rates.get(&(*date, *bin)).copied())
                .collect()
        })
        .collect();

    PivotTable::new(dates, bins, rows)
}
