//! Data types used by the cleaning and aggregation pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single row deserialized from the county election results CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElectionRow {
    pub county_fips: Option<f64>,
    pub per_gop: Option<f64>,
    pub per_dem: Option<f64>,
}

/// A single row deserialized from the county vaccination CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVaccinationRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "FIPS")]
    pub fips: String,
    #[serde(rename = "Series_Complete_Yes")]
    pub series_complete_yes: Option<f64>,
    #[serde(rename = "Series_Complete_Pop_Pct")]
    pub series_complete_pop_pct: Option<f64>,
}

/// County identifier. Election codes are normalized to five zero-padded
/// digits; vaccination codes are taken as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CountyFips(String);

impl CountyFips {
    /// Sentinel used when the election table has no identifier for a row.
    pub const UNKNOWN: &'static str = "00000";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountyFips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Political-lean bucket: a county's democratic share rounded to the
/// nearest tenth, stored as tenths in `1..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "f64")]
pub struct Bin(u8);

impl Bin {
    pub const MIN_TENTHS: u8 = 1;
    pub const MAX_TENTHS: u8 = 9;

    /// Builds a bin from a tenths count, rejecting anything outside `1..=9`.
    pub fn from_tenths(tenths: u8) -> Option<Self> {
        (Self::MIN_TENTHS..=Self::MAX_TENTHS)
            .contains(&tenths)
            .then_some(Self(tenths))
    }

    pub fn tenths(self) -> u8 {
        self.0
    }

    /// Numeric value of the bin, e.g. `0.3`.
    pub fn value(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl From<Bin> for f64 {
    fn from(bin: Bin) -> f64 {
        bin.value()
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0.{}", self.0)
    }
}

/// Cleaned vaccination row. `population` is the estimate back-filled from
/// the county's value on the latest date in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct VaccinationRecord {
    pub date: NaiveDate,
    pub fips: CountyFips,
    pub vaccinated_count: Option<f64>,
    pub vaccinated_rate: Option<f64>,
    pub population: Option<f64>,
}

/// Cleaned election row. The two shares always sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectionRecord {
    pub fips: CountyFips,
    pub republican_share: f64,
    pub democratic_share: f64,
}

/// A vaccination row matched to its county's election result.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub date: NaiveDate,
    pub fips: CountyFips,
    pub vaccinated_count: Option<f64>,
    pub vaccinated_rate: Option<f64>,
    pub population: Option<f64>,
    pub republican_share: f64,
    pub democratic_share: f64,
}

/// Summed totals for one (date, bin) group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupTotals {
    pub vaccinated: f64,
    pub population: f64,
}

impl GroupTotals {
    /// Population-weighted rate for the group. NaN (e.g. `0 / 0`) is reported
    /// as missing.
    pub fn rate(&self) -> Option<f64> {
        let rate = self.vaccinated / self.population;
        (!rate.is_nan()).then_some(rate)
    }
}

/// Date × bin matrix of rates. Rows follow `dates`, columns follow `bins`,
/// both ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    dates: Vec<NaiveDate>,
    bins: Vec<Bin>,
    rows: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    /// Builds a table from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the row count or any row width does not match
    /// the dates and bins.
    pub fn new(
        dates: Vec<NaiveDate>,
        bins: Vec<Bin>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            rows.len() == dates.len(),
            "pivot has {} rows for {} dates",
            rows.len(),
            dates.len()
        );
        if let Some(bad) = rows.iter().position(|row| row.len() != bins.len()) {
            anyhow::bail!(
                "pivot row {} has {} cells for {} bins",
                bad,
                rows[bad].len(),
                bins.len()
            );
        }
        Ok(Self { dates, bins, rows })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Rate for `date` and `bin`, if both exist and the cell is filled.
    pub fn get(&self, date: NaiveDate, bin: Bin) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        let col = self.bins.binary_search(&bin).ok()?;
        self.rows[row][col]
    }

    /// The date-ordered series for the column at `index`.
    pub fn column(&self, index: usize) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    pub(crate) fn set_column(&mut self, index: usize, values: Vec<Option<f64>>) {
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[index] = value;
        }
    }

    /// Drops every date that has a missing cell in any column.
    pub fn drop_incomplete_rows(self) -> Self {
        let (dates, rows) = self
            .dates
            .into_iter()
            .zip(self.rows)
            .filter(|(_, row)| row.iter().all(Option::is_some))
            .unzip();
        Self {
            dates,
            bins: self.bins,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    #[test]
    fn test_bin_bounds() {
        assert!(Bin::from_tenths(0).is_none());
        assert!(Bin::from_tenths(10).is_none());
        assert_eq!(Bin::from_tenths(3).unwrap().value(), 0.3);
        assert_eq!(Bin::from_tenths(9).unwrap().to_string(), "0.9");
    }

    #[test]
    fn test_group_rate_nan_is_missing() {
        let empty = GroupTotals::default();
        assert_eq!(empty.rate(), None);

        let totals = GroupTotals {
            vaccinated: 30.0,
            population: 60.0,
        };
        assert_eq!(totals.rate(), Some(0.5));
    }

    #[test]
    fn test_pivot_new_rejects_ragged_rows() {
        let bins = vec![Bin::from_tenths(2).unwrap(), Bin::from_tenths(5).unwrap()];
        let result = PivotTable::new(vec![day(1)], bins, vec![vec![Some(1.0)]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let bins = vec![Bin::from_tenths(2).unwrap(), Bin::from_tenths(5).unwrap()];
        let table = PivotTable::new(
            vec![day(1), day(2), day(3)],
            bins,
            vec![
                vec![Some(1.0), None],
                vec![Some(2.0), Some(3.0)],
                vec![None, Some(4.0)],
            ],
        )
        .unwrap();

        let complete = table.drop_incomplete_rows();
        assert_eq!(complete.dates(), &[day(2)]);
        assert_eq!(complete.rows(), &[vec![Some(2.0), Some(3.0)]]);
    }

    #[test]
    fn test_get_looks_up_by_date_and_bin() {
        let b5 = Bin::from_tenths(5).unwrap();
        let table = PivotTable::new(vec![day(1)], vec![b5], vec![vec![Some(7.5)]]).unwrap();
        assert_eq!(table.get(day(1), b5), Some(7.5));
        assert_eq!(table.get(day(2), b5), None);
        assert_eq!(table.get(day(1), Bin::from_tenths(6).unwrap()), None);
    }
}
