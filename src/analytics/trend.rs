//! Daily-OEE trend fitting and forward projection
//!
//! Ordinary least squares of daily average OEE against a zero-based day
//! index, with R-squared as the trend-strength estimate. The fitted line is
//! projected `days_forecast` days past the history window, each value
//! clamped to [0, 100].

use chrono::Duration;

use crate::config::TrendThresholds;
use crate::store::DailyOee;
use crate::types::{ForecastPoint, TrendAnalysis, TrendDirection, TrendReport};

/// Fit and project the OEE trend for a line.
///
/// Fewer distinct days than the configured minimum is an expected condition
/// returned as [`TrendAnalysis::InsufficientData`].
pub fn forecast_trend(
    daily: &[DailyOee],
    days_forecast: usize,
    thresholds: &TrendThresholds,
) -> TrendAnalysis {
    if daily.is_empty() || daily.len() < thresholds.min_days {
        return TrendAnalysis::InsufficientData {
            days_available: daily.len(),
            days_required: thresholds.min_days,
        };
    }

    let n = daily.len();
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = daily.iter().map(|d| d.avg_oee).sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, day) in daily.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (day.avg_oee - y_mean);
        denominator += dx * dx;
    }

    let slope = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };
    let intercept = y_mean - slope * x_mean;

    let ss_res: f64 = daily
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let fitted = slope * i as f64 + intercept;
            (day.avg_oee - fitted).powi(2)
        })
        .sum();
    let ss_tot: f64 = daily
        .iter()
        .map(|day| (day.avg_oee - y_mean).powi(2))
        .sum();
    let r_squared = if ss_tot != 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    };

    let trend = classify_slope(slope, thresholds);

    // Project from the day after the last history date.
    let last_date = daily[n - 1].date;
    let forecast = (0..days_forecast)
        .map(|i| {
            let day_index = (n + i) as f64;
            ForecastPoint {
                date: last_date + Duration::days(i as i64 + 1),
                predicted_oee: (slope * day_index + intercept).clamp(0.0, 100.0),
            }
        })
        .collect();

    TrendAnalysis::Forecast(TrendReport {
        historical_average: y_mean,
        trend,
        trend_strength: r_squared,
        daily_change: slope,
        intercept,
        forecast,
    })
}

/// IMPROVING above the positive threshold, DECLINING below the negative
/// one, STABLE in between.
pub fn classify_slope(slope: f64, thresholds: &TrendThresholds) -> TrendDirection {
    if slope > thresholds.improving_slope {
        TrendDirection::Improving
    } else if slope < thresholds.declining_slope {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> Vec<DailyOee> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyOee {
                date: start + Duration::days(i as i64),
                avg_oee: *v,
            })
            .collect()
    }

    fn thresholds() -> TrendThresholds {
        TrendThresholds::default()
    }

    fn forecast(values: &[f64], days: usize) -> TrendReport {
        match forecast_trend(&series(values), days, &thresholds()) {
            TrendAnalysis::Forecast(report) => report,
            TrendAnalysis::InsufficientData { .. } => panic!("expected a forecast"),
        }
    }

    #[test]
    fn six_days_is_insufficient() {
        let result = forecast_trend(
            &series(&[70.0, 71.0, 72.0, 73.0, 74.0, 75.0]),
            7,
            &thresholds(),
        );
        assert!(matches!(
            result,
            TrendAnalysis::InsufficientData {
                days_available: 6,
                days_required: 7,
            }
        ));
    }

    #[test]
    fn perfect_line_recovers_slope_and_r_squared() {
        // y = 0.5x + 70 over 10 days
        let values: Vec<f64> = (0..10).map(|i| 70.0 + 0.5 * i as f64).collect();
        let report = forecast(&values, 3);

        assert!((report.daily_change - 0.5).abs() < 1e-9);
        assert!((report.intercept - 70.0).abs() < 1e-9);
        assert!((report.trend_strength - 1.0).abs() < 1e-9);
        assert_eq!(report.trend, TrendDirection::Improving);
    }

    #[test]
    fn slope_classification_thresholds() {
        let t = thresholds();
        assert_eq!(classify_slope(0.15, &t), TrendDirection::Improving);
        assert_eq!(classify_slope(-0.15, &t), TrendDirection::Declining);
        assert_eq!(classify_slope(0.05, &t), TrendDirection::Stable);
        assert_eq!(classify_slope(0.1, &t), TrendDirection::Stable);
        assert_eq!(classify_slope(-0.1, &t), TrendDirection::Stable);
    }

    #[test]
    fn flat_series_has_zero_variance_and_zero_r_squared() {
        let report = forecast(&[82.0; 8], 2);
        assert_eq!(report.daily_change, 0.0);
        assert_eq!(report.trend_strength, 0.0);
        assert_eq!(report.trend, TrendDirection::Stable);
        assert_eq!(report.historical_average, 82.0);
    }

    #[test]
    fn forecast_dates_follow_history_end() {
        let values: Vec<f64> = (0..10).map(|i| 70.0 + 0.5 * i as f64).collect();
        let report = forecast(&values, 3);

        let last_history = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(report.forecast.len(), 3);
        assert_eq!(report.forecast[0].date, last_history + Duration::days(1));
        assert_eq!(report.forecast[2].date, last_history + Duration::days(3));

        // Projection continues the fitted line: day index 10 -> 75.0
        assert!((report.forecast[0].predicted_oee - 75.0).abs() < 1e-9);
    }

    #[test]
    fn forecast_values_are_clamped() {
        // Steep decline crossing zero inside the forecast horizon.
        let values: Vec<f64> = (0..10).map(|i| 45.0 - 5.0 * i as f64).collect();
        let report = forecast(&values, 5);

        assert_eq!(report.trend, TrendDirection::Declining);
        for point in &report.forecast {
            assert!((0.0..=100.0).contains(&point.predicted_oee));
        }
        assert_eq!(report.forecast[4].predicted_oee, 0.0);
    }
}
