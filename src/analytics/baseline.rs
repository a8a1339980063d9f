//! Baseline construction and univariate z-score detection
//!
//! Each asset's baseline is the mean/stddev of its OEE sub-metrics over a
//! historical lookback window, rebuilt per detection run and never
//! persisted. Recent samples are then scored metric-by-metric:
//! z = |value - mean| / stddev, with severity from the configured sigma
//! bands and confidence from the standard-normal CDF.

use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashMap;

use crate::config::DetectionThresholds;
use crate::store::{BaselineStats, MetricSample};
use crate::types::{Anomaly, OeeMetric, Severity, TimeRange};

/// Learned mean/stddev for one metric of one asset.
///
/// `stddev` is `None` when the store could not compute one (single-row
/// history); that metric is then skipped, not treated as anomalous.
#[derive(Debug, Clone, Copy)]
pub struct MetricBaseline {
    pub mean: f64,
    pub stddev: Option<f64>,
}

/// Per-asset baselines for the four OEE sub-metrics.
#[derive(Debug, Clone)]
pub struct AssetBaseline {
    pub asset_id: String,
    pub window: TimeRange,
    pub oee: MetricBaseline,
    pub availability: MetricBaseline,
    pub performance: MetricBaseline,
    pub quality: MetricBaseline,
}

impl AssetBaseline {
    fn metric(&self, metric: OeeMetric) -> &MetricBaseline {
        match metric {
            OeeMetric::Oee => &self.oee,
            OeeMetric::Availability => &self.availability,
            OeeMetric::Performance => &self.performance,
            OeeMetric::Quality => &self.quality,
        }
    }
}

/// Build per-asset baselines from aggregated store statistics.
///
/// Assets absent from the historical window produce no entry and are
/// skipped downstream.
pub fn build_baselines(
    stats: &[BaselineStats],
    window: &TimeRange,
) -> HashMap<String, AssetBaseline> {
    stats
        .iter()
        .map(|s| {
            (
                s.asset_id.clone(),
                AssetBaseline {
                    asset_id: s.asset_id.clone(),
                    window: *window,
                    oee: MetricBaseline {
                        mean: s.avg_oee,
                        stddev: s.std_oee,
                    },
                    availability: MetricBaseline {
                        mean: s.avg_availability,
                        stddev: s.std_availability,
                    },
                    performance: MetricBaseline {
                        mean: s.avg_performance,
                        stddev: s.std_performance,
                    },
                    quality: MetricBaseline {
                        mean: s.avg_quality,
                        stddev: s.std_quality,
                    },
                },
            )
        })
        .collect()
}

const CHECKED_METRICS: [OeeMetric; 4] = [
    OeeMetric::Oee,
    OeeMetric::Availability,
    OeeMetric::Performance,
    OeeMetric::Quality,
];

/// Score recent samples against their asset's baseline.
///
/// Samples for assets with no baseline are skipped entirely; within a
/// sample, each of the four metrics is checked independently.
pub fn detect_anomalies(
    samples: &[MetricSample],
    baselines: &HashMap<String, AssetBaseline>,
    thresholds: &DetectionThresholds,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for sample in samples {
        let Some(baseline) = baselines.get(&sample.asset_id) else {
            continue;
        };

        for metric in CHECKED_METRICS {
            let value = match metric {
                OeeMetric::Oee => sample.oee,
                OeeMetric::Availability => sample.availability,
                OeeMetric::Performance => sample.performance,
                OeeMetric::Quality => sample.quality,
            };
            if let Some(anomaly) = check_metric(sample, metric, value, baseline, thresholds) {
                anomalies.push(anomaly);
            }
        }
    }

    anomalies
}

fn check_metric(
    sample: &MetricSample,
    metric: OeeMetric,
    value: f64,
    baseline: &AssetBaseline,
    thresholds: &DetectionThresholds,
) -> Option<Anomaly> {
    let MetricBaseline { mean, stddev } = *baseline.metric(metric);

    // Zero or undefined spread means the z-score is undefined; skip rather
    // than divide.
    let stddev = stddev.filter(|s| *s > 0.0)?;

    let z = (value - mean).abs() / stddev;
    let severity = severity_for_z(z, thresholds)?;

    let direction = if value < mean { "below" } else { "above" };
    let description = format!(
        "{} is {:.1} points {} normal ({:.1})",
        metric,
        (value - mean).abs(),
        direction,
        mean
    );

    Some(Anomaly {
        timestamp: sample.timestamp,
        asset_id: sample.asset_id.clone(),
        metric,
        value,
        expected_value: mean,
        deviation: z,
        severity,
        confidence: confidence_for_z(z),
        description,
    })
}

/// Highest sigma band met by the z-score, checked in descending order.
pub fn severity_for_z(z: f64, thresholds: &DetectionThresholds) -> Option<Severity> {
    if z >= thresholds.critical_sigma {
        Some(Severity::Critical)
    } else if z >= thresholds.high_sigma {
        Some(Severity::High)
    } else if z >= thresholds.medium_sigma {
        Some(Severity::Medium)
    } else if z >= thresholds.low_sigma {
        Some(Severity::Low)
    } else {
        None
    }
}

/// Detection confidence in percent: Φ(z)·100, capped at 99.9.
pub fn confidence_for_z(z: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (normal.cdf(z) * 100.0).min(99.9),
        Err(_) => 0.0,
    }
}
