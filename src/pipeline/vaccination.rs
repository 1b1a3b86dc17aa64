use crate::pipeline::types::{CountyFips, RawVaccinationRow, VaccinationRecord};
use crate::pipeline::utility::round_half_even;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Textual date format used by the vaccination table.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Cleans the raw vaccination rows: parses dates, estimates each county's
/// population from its latest-date row, and back-fills that estimate onto
/// every row for the county.
///
/// # Errors
///
/// Returns an error on the first date that does not match [`DATE_FORMAT`].
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn clean_vaccinations(rows: Vec<RawVaccinationRow>) -> Result<Vec<VaccinationRecord>> {
    let mut zero_rate = 0usize;
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.into_iter().enumerate() {
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
            .with_context(|| format!("row {}: invalid date {:?}", index + 1, row.date))?;

        if row.series_complete_pop_pct == Some(0.0) {
            zero_rate += 1;
        }

        records.push(VaccinationRecord {
            date,
            fips: CountyFips::new(row.fips),
            vaccinated_count: row.series_complete_yes,
            vaccinated_rate: row.series_complete_pop_pct,
            population: population_estimate(row.series_complete_yes, row.series_complete_pop_pct),
        });
    }

    if zero_rate > 0 {
        // A zero rate divides by zero; the resulting non-finite estimate is
        // carried through unchanged.
        warn!(rows = zero_rate, "Zero vaccination rate yields a non-finite population estimate");
    }

    let latest = latest_population(&records);

    let mut unmatched = 0usize;
    for record in &mut records {
        record.population = latest.get(&record.fips).copied().flatten();
        if !latest.contains_key(&record.fips) {
            unmatched += 1;
        }
    }

    debug!(
        counties = latest.len(),
        rows_without_population = unmatched,
        "Back-filled population from latest date"
    );

    Ok(records)
}

/// Per-row population estimate `round(count / rate)`; missing when either
/// input is missing.
pub fn population_estimate(count: Option<f64>, rate: Option<f64>) -> Option<f64> {
    Some(round_half_even(count? / rate?, 0))
}

/// Maps each county present on the latest date to that row's population
/// estimate. The first row wins if a county repeats on that date.
pub fn latest_population(records: &[VaccinationRecord]) -> HashMap<CountyFips, Option<f64>> {
    let mut map = HashMap::new();

    let Some(latest) = records.iter().map(|r| r.date).max() else {
        return map;
    };

    for record in records.iter().filter(|r| r.date == latest) {
        map.entry(record.fips.clone()).or_insert(record.population);
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, fips: &str, count: Option<f64>, pct: Option<f64>) -> RawVaccinationRow {
        RawVaccinationRow {
            date: date.to_string(),
            fips: fips.to_string(),
            series_complete_yes: count,
            series_complete_pop_pct: pct,
        }
    }

    #[test]
    fn test_population_estimate_rounds_half_even() {
        assert_eq!(population_estimate(Some(25.0), Some(10.0)), Some(2.0));
        assert_eq!(population_estimate(Some(35.0), Some(10.0)), Some(4.0));
        assert_eq!(population_estimate(None, Some(10.0)), None);
        assert_eq!(population_estimate(Some(1.0), None), None);
    }

    #[test]
    fn test_zero_rate_is_not_finite() {
        let estimate = population_estimate(Some(10.0), Some(0.0)).unwrap();
        assert!(estimate.is_infinite());
        let estimate = population_estimate(Some(0.0), Some(0.0)).unwrap();
        assert!(estimate.is_nan());
    }

    #[test]
    fn test_population_is_constant_per_county() {
        let rows = vec![
            raw("01/10/2021", "01001", Some(100.0), Some(1.0)),
            raw("01/11/2021", "01001", Some(300.0), Some(2.0)),
            raw("01/12/2021", "01001", Some(500.0), Some(2.5)),
            raw("01/10/2021", "01003", Some(50.0), Some(5.0)),
            raw("01/12/2021", "01003", Some(90.0), Some(9.0)),
        ];

        let cleaned = clean_vaccinations(rows).unwrap();

        for record in &cleaned {
            let expected = match record.fips.as_str() {
                "01001" => 200.0,
                "01003" => 10.0,
                other => panic!("unexpected county {other}"),
            };
            assert_eq!(record.population, Some(expected));
        }
    }

    #[test]
    fn test_county_missing_from_latest_date_has_no_population() {
        let rows = vec![
            raw("01/10/2021", "01001", Some(100.0), Some(1.0)),
            raw("01/11/2021", "01003", Some(50.0), Some(5.0)),
        ];

        let cleaned = clean_vaccinations(rows).unwrap();
        assert_eq!(cleaned[0].population, None);
        assert_eq!(cleaned[1].population, Some(10.0));
    }

    #[test]
    fn test_parses_unpadded_dates() {
        let cleaned = clean_vaccinations(vec![raw("1/5/2021", "01001", None, None)]).unwrap();
        assert_eq!(
            cleaned[0].date,
            NaiveDate::from_ymd_opt(2021, 1, 5).unwrap()
        );
    }

    #[test]
    fn test_bad_date_is_fatal() {
        let rows = vec![
            raw("01/10/2021", "01001", Some(1.0), Some(1.0)),
            raw("2021-01-11", "01001", Some(1.0), Some(1.0)),
        ];

        let err = clean_vaccinations(rows).unwrap_err();
        assert!(err.to_string().contains("2021-01-11"));
    }

    #[test]
    fn test_latest_population_first_duplicate_wins() {
        let date = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
        let record = |population| VaccinationRecord {
            date,
            fips: CountyFips::new("01001"),
            vaccinated_count: None,
            vaccinated_rate: None,
            population,
        };

        let map = latest_population(&[record(Some(7.0)), record(Some(9.0))]);
        assert_eq!(map.get(&CountyFips::new("01001")), Some(&Some(7.0)));
    }
}
