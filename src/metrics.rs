use crate::errors::{Result, WatchlistError};
use crate::models::dashboard::SymbolMetrics;
use crate::models::price::PricePoint;
use crate::util::round2;

/// Derive close-to-close change metrics from an ascending price series.
///
/// With a single point the previous close falls back to the latest close, so
/// both changes are zero. A zero previous close yields a zero percent change.
pub fn compute_metrics(points: &[PricePoint]) -> Result<SymbolMetrics> {
    let latest = points
        .last()
        .ok_or_else(|| WatchlistError::DataError("cannot compute metrics for an empty series".to_string()))?;

    let latest_close = latest.close;
    let previous_close = if points.len() >= 2 {
        points[points.len() - 2].close
    } else {
        latest_close
    };

    let absolute_change = round2(latest_close - previous_close);
    let percent_change = if previous_close != 0.0 {
        round2(absolute_change / previous_close * 100.0)
    } else {
        0.0
    };

    Ok(SymbolMetrics {
        latest_close,
        previous_close,
        absolute_change,
        percent_change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dashboard::Trend;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 2 + i as u32).unwrap();
                PricePoint::new(date, c, c, c, c)
            })
            .collect()
    }

    #[test]
    fn empty_series_is_an_error() {
        assert!(compute_metrics(&[]).is_err());
    }

    #[test]
    fn single_point_has_no_change() {
        let metrics = compute_metrics(&series(&[42.5])).unwrap();
        assert_eq!(metrics.previous_close, 42.5);
        assert_eq!(metrics.latest_close, 42.5);
        assert_eq!(metrics.absolute_change, 0.0);
        assert_eq!(metrics.percent_change, 0.0);
        assert_eq!(metrics.trend(), Trend::Down);
    }

    #[test]
    fn uses_last_two_closes() {
        let metrics = compute_metrics(&series(&[90.0, 100.0, 105.0])).unwrap();
        assert_eq!(metrics.previous_close, 100.0);
        assert_eq!(metrics.absolute_change, 5.0);
        assert_eq!(metrics.percent_change, 5.0);
        assert_eq!(metrics.trend(), Trend::Up);
    }

    #[test]
    fn negative_change_rounds_to_two_places() {
        let metrics = compute_metrics(&series(&[50.0, 48.5])).unwrap();
        assert_eq!(metrics.absolute_change, -1.5);
        assert_eq!(metrics.percent_change, -3.0);
        assert_eq!(metrics.trend(), Trend::Down);

        let metrics = compute_metrics(&series(&[3.0, 3.1])).unwrap();
        assert_eq!(metrics.absolute_change, 0.1);
        assert_eq!(metrics.percent_change, 3.33);
    }

    #[test]
    fn zero_previous_close_guards_division() {
        let metrics = compute_metrics(&series(&[0.0, 12.0])).unwrap();
        assert_eq!(metrics.absolute_change, 12.0);
        assert_eq!(metrics.percent_change, 0.0);
    }

    #[test]
    fn percent_change_uses_rounded_absolute_change() {
        let points = series(&[7.0, 7.004]);
        let metrics = compute_metrics(&points).unwrap();
        assert_eq!(metrics.absolute_change, 0.0);
        assert_eq!(metrics.percent_change, 0.0);
        assert_eq!(metrics.trend(), Trend::Down);
    }

    #[test]
    fn tiny_drop_reports_unsigned_zero() {
        let metrics = compute_metrics(&series(&[100.0, 99.999])).unwrap();
        assert!(metrics.absolute_change.is_sign_positive());
        assert!(metrics.percent_change.is_sign_positive());
        assert_eq!(format!("{:+.2}", metrics.absolute_change), "+0.00");
        assert_eq!(metrics.trend(), Trend::Down);
    }
}
