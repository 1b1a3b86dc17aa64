use crate::pipeline::types::PivotTable;
use crate::pipeline::utility::mean;
use tracing::debug;

/// Trailing window length of the moving average.
pub const WINDOW: usize = 14;

/// Trailing mean over `window` values. A position yields a value only when
/// all `window` inputs ending there are present; the first `window - 1`
/// positions are always missing.
pub fn rolling_mean(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; series.len()];
    }

    (0..series.len())
        .map(|end| {
            let start = (end + 1).checked_sub(window)?;
            let values: Vec<f64> = series[start..=end].iter().copied().collect::<Option<_>>()?;
            let avg = mean(&values);
            (!avg.is_nan()).then_some(avg)
        })
        .collect()
}

/// Applies the `window` moving average twice to every bin column, then
/// drops each date that still has a missing cell.
#[tracing::instrument(skip(table), fields(dates = table.len(), bins = table.bins().len()))]
pub fn smooth(mut table: PivotTable, window: usize) -> PivotTable {
    let raw_dates = table.len();

    for index in 0..table.bins().len() {
        let once = rolling_mean(&table.column(index), window);
        let twice = rolling_mean(&once, window);
        table.set_column(index, twice);
    }

    let table = table.drop_incomplete_rows();
    debug!(
        raw_dates,
        smoothed_dates = table.len(),
        "Smoothed rate series"
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Bin;
    use chrono::{Days, NaiveDate};

    fn table(columns: Vec<Vec<Option<f64>>>) -> PivotTable {
        let n = columns[0].len();
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let dates = (0..n as u64).map(|i| start + Days::new(i)).collect();
        let bins = (1..=columns.len() as u8)
            .map(|t| Bin::from_tenths(t).unwrap())
            .collect();
        let rows = (0..n)
            .map(|i| columns.iter().map(|c| c[i]).collect())
            .collect();
        PivotTable::new(dates, bins, rows).unwrap()
    }

    #[test]
    fn test_rolling_mean_warm_up() {
        let series: Vec<Option<f64>> = (1..=5).map(|v| Some(v as f64)).collect();
        let out = rolling_mean(&series, 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_rolling_mean_gap_poisons_window() {
        let series = vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)];
        let out = rolling_mean(&series, 2);
        assert_eq!(
            out,
            vec![None, Some(1.5), None, None, Some(4.5), Some(5.5)]
        );
    }

    #[test]
    fn test_rolling_mean_short_series() {
        let series = vec![Some(1.0); 5];
        assert!(rolling_mean(&series, WINDOW).iter().all(Option::is_none));
    }

    #[test]
    fn test_smooth_drops_double_warm_up() {
        let n = 40;
        let linear: Vec<Option<f64>> = (0..n).map(|i| Some(i as f64)).collect();
        let flat = vec![Some(5.0); n];

        let smoothed = smooth(table(vec![linear, flat]), WINDOW);

        assert_eq!(smoothed.len(), n - 2 * (WINDOW - 1));
        assert!(smoothed.rows().iter().flatten().all(Option::is_some));
        // Two 14-wide means of a ramp lag it by 13 positions in total.
        let first = smoothed.rows()[0][0].unwrap();
        assert!((first - 13.0).abs() < 1e-9);
        assert_eq!(smoothed.rows()[0][1], Some(5.0));
    }

    #[test]
    fn test_smooth_drops_dates_missing_in_any_column() {
        let n = 30;
        let full = vec![Some(1.0); n];
        let mut gappy = vec![Some(2.0); n];
        gappy[29] = None;

        let smoothed = smooth(table(vec![full, gappy]), WINDOW);

        // Dates 26..=28 survive; 29 is missing in the second column.
        assert_eq!(smoothed.len(), 3);
    }
}
