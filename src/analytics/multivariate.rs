//! Multivariate anomaly detection via Mahalanobis distance
//!
//! Treats (oee, temperature, pressure, vibration, current) as one feature
//! vector and measures each observation's distance from the window centroid
//! under the feature covariance. Catches parameter combinations that look
//! normal metric-by-metric.
//!
//! The covariance is pseudo-inverted (SVD) so that singular matrices from
//! constant or duplicated columns still yield finite distances. A
//! pseudo-inversion that genuinely fails surfaces as
//! [`AnalyticsError::CovarianceNotInvertible`] so callers can tell "no
//! anomalies" from "analysis could not be performed".

use nalgebra::{DMatrix, DVector};

use crate::config::MultivariateThresholds;
use crate::error::AnalyticsError;
use crate::store::FeatureRow;
use crate::types::{MultivariateObservation, ParameterSnapshot, Severity};

/// Feature count: oee, temperature, pressure, vibration, current.
const FEATURES: usize = 5;

/// Singular values below this are treated as zero by the pseudo-inverse.
const PINV_EPSILON: f64 = 1e-10;

/// Score a feature window; rows below the minimum count yield an empty
/// result (sparse data is expected, not a fault).
pub fn detect_multivariate(
    rows: &[FeatureRow],
    thresholds: &MultivariateThresholds,
) -> Result<Vec<MultivariateObservation>, AnalyticsError> {
    if rows.len() < thresholds.min_rows {
        return Ok(Vec::new());
    }

    let matrix = impute_features(rows);
    let mean = column_means(&matrix);
    let cov = covariance(&matrix, &mean);

    let pinv = cov
        .svd(true, true)
        .pseudo_inverse(PINV_EPSILON)
        .map_err(|e| AnalyticsError::CovarianceNotInvertible(e.to_string()))?;

    let mut observations = Vec::new();
    for (row, features) in rows.iter().zip(matrix.iter()) {
        let diff = DVector::from_iterator(
            FEATURES,
            features.iter().zip(mean.iter()).map(|(x, m)| x - m),
        );
        // The pseudo-inverse can leave a tiny negative quadratic form on
        // degenerate data; floor it before the square root.
        let squared = (&pinv * &diff).dot(&diff).max(0.0);
        let distance = squared.sqrt();

        if distance > thresholds.distance_threshold {
            let severity = if distance > thresholds.high_severity_distance {
                Severity::High
            } else {
                Severity::Medium
            };
            observations.push(MultivariateObservation {
                timestamp: row.timestamp,
                asset_id: row.asset_id.clone(),
                distance,
                severity,
                description: "Multiple parameters showing unusual combination".to_string(),
                parameters: ParameterSnapshot {
                    oee: features[0],
                    temperature: features[1],
                    pressure: features[2],
                    vibration: features[3],
                    current: features[4],
                },
            });
        }
    }

    Ok(observations)
}

/// Materialize the feature matrix, filling missing oee/current values with
/// the column mean over the rows that have one.
fn impute_features(rows: &[FeatureRow]) -> Vec<[f64; FEATURES]> {
    let oee_fill = optional_mean(rows.iter().map(|r| r.oee));
    let current_fill = optional_mean(rows.iter().map(|r| r.current));

    rows.iter()
        .map(|r| {
            [
                r.oee.unwrap_or(oee_fill),
                r.temperature,
                r.pressure,
                r.vibration,
                r.current.unwrap_or(current_fill),
            ]
        })
        .collect()
}

/// Mean over the present values; 0 when every value is missing.
fn optional_mean(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values.flatten() {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn column_means(matrix: &[[f64; FEATURES]]) -> [f64; FEATURES] {
    let n = matrix.len() as f64;
    let mut means = [0.0; FEATURES];
    for row in matrix {
        for (m, x) in means.iter_mut().zip(row.iter()) {
            *m += x;
        }
    }
    for m in &mut means {
        *m /= n;
    }
    means
}

/// Sample covariance matrix (n-1 denominator).
fn covariance(matrix: &[[f64; FEATURES]], mean: &[f64; FEATURES]) -> DMatrix<f64> {
    let n = matrix.len();
    let denom = (n - 1).max(1) as f64;

    DMatrix::from_fn(FEATURES, FEATURES, |i, j| {
        matrix
            .iter()
            .map(|row| (row[i] - mean[i]) * (row[j] - mean[j]))
            .sum::<f64>()
            / denom
    })
}
