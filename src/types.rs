//! Shared data structures for the loss analytics pipeline
//!
//! This module defines the core types flowing through the analytics engine:
//! - Severity and metric identifiers shared by every detector
//! - Anomaly / PatternEvent / MultivariateObservation (detection outputs)
//! - OeeRecord (effectiveness metrics)
//! - LossAnalysis / TrendAnalysis (loss ranking and forecasting outputs)
//! - Alert (aggregated, operator-actionable findings)
//!
//! All outputs are plain structured data consumed as JSON by the
//! orchestrating service; none of them carry behavior.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Severity & Metric Identifiers
// ============================================================================

/// Finding severity, ranked LOW < MEDIUM < HIGH < CRITICAL.
///
/// The derived `Ord` encodes the rank explicitly. Alert ordering must use
/// this rank; sorting by the serialized label would interleave the levels
/// (alphabetically CRITICAL < HIGH < LOW < MEDIUM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// The four OEE sub-metrics tracked by the univariate detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OeeMetric {
    #[serde(rename = "OEE")]
    Oee,
    Availability,
    Performance,
    Quality,
}

impl std::fmt::Display for OeeMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OeeMetric::Oee => write!(f, "OEE"),
            OeeMetric::Availability => write!(f, "Availability"),
            OeeMetric::Performance => write!(f, "Performance"),
            OeeMetric::Quality => write!(f, "Quality"),
        }
    }
}

// ============================================================================
// Analysis Window
// ============================================================================

/// Closed time window `[start, end)` over which a batch analysis runs.
///
/// Every engine operation is a pure function of the rows inside an explicit
/// window; there is no implicit "now" in the analytics core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Planned production time for the window, in minutes.
    pub fn duration_minutes(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 60.0
    }
}

// ============================================================================
// Univariate Detection Output
// ============================================================================

/// A single-metric statistical anomaly detected against a learned baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub timestamp: DateTime<Utc>,
    pub asset_id: String,
    pub metric: OeeMetric,
    /// Observed value
    pub value: f64,
    /// Baseline mean the value was compared against
    pub expected_value: f64,
    /// Z-score: |value - mean| / stddev
    pub deviation: f64,
    pub severity: Severity,
    /// Detection confidence in percent, capped at 99.9
    pub confidence: f64,
    pub description: String,
}

// ============================================================================
// Pattern Detection Output
// ============================================================================

/// Heuristic pattern rule that fired over a telemetry window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    SuddenDrop,
    Trend,
    ThresholdBreach,
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternKind::SuddenDrop => write!(f, "SUDDEN_DROP"),
            PatternKind::Trend => write!(f, "TREND"),
            PatternKind::ThresholdBreach => write!(f, "THRESHOLD_BREACH"),
        }
    }
}

/// A pattern-rule event over a recent telemetry window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEvent {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub metric: String,
    pub timestamp: DateTime<Utc>,
    /// Offending row value, when the rule fires on a specific row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub severity: Severity,
    pub description: String,
}

// ============================================================================
// Multivariate Detection Output
// ============================================================================

/// Feature values behind a multivariate finding, kept for operator context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub oee: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub vibration: f64,
    pub current: f64,
}

/// An observation whose Mahalanobis distance from the window centroid
/// exceeds the chi-square threshold: a parameter combination no single
/// metric check would flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultivariateObservation {
    pub timestamp: DateTime<Utc>,
    pub asset_id: String,
    pub distance: f64,
    pub severity: Severity,
    pub description: String,
    pub parameters: ParameterSnapshot,
}

// ============================================================================
// OEE Calculation Output
// ============================================================================

/// OEE components for an asset over a window.
///
/// All four percentage fields are clamped to [0, 100]; performance can
/// mathematically exceed 100 when actual cycle time beats the ideal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OeeRecord {
    pub timestamp: DateTime<Utc>,
    pub asset_id: String,
    pub line_id: String,
    pub oee: f64,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    /// Total runtime in the window (minutes)
    pub runtime: f64,
    /// Total downtime in the window (minutes)
    pub downtime: f64,
    pub total_count: i64,
    pub good_count: i64,
    pub reject_count: i64,
}

// ============================================================================
// Loss Pareto Output
// ============================================================================

/// Ranked loss cause with its contribution to total loss time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParetoEntry {
    pub category: String,
    pub subcategory: String,
    pub reason: String,
    pub duration: f64,
    pub impact: f64,
    pub occurrences: i64,
    /// Share of total loss time, percent (2 decimals)
    pub percentage: f64,
    /// Running share, non-decreasing down the ranked list
    pub cumulative_percentage: f64,
}

/// Remediation priority for a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Improvement recommendation derived from a vital-few loss entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub area: String,
    pub priority: Priority,
    pub action: String,
    pub expected_impact: String,
}

/// Full Pareto report for a line and window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossParetoReport {
    pub period: TimeRange,
    pub total_loss_time: f64,
    pub total_losses: usize,
    pub pareto_analysis: Vec<ParetoEntry>,
    /// Prefix of the ranked list through the first entry reaching the
    /// cumulative cutoff (the whole list when the cutoff is never reached)
    pub vital_few: Vec<ParetoEntry>,
    pub recommendations: Vec<Recommendation>,
}

/// Loss analysis outcome. A window with no recorded losses is an expected
/// result, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LossAnalysis {
    NoLosses,
    Pareto(LossParetoReport),
}

// ============================================================================
// Trend Forecast Output
// ============================================================================

/// Direction of the fitted daily-OEE trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "IMPROVING"),
            TrendDirection::Declining => write!(f, "DECLINING"),
            TrendDirection::Stable => write!(f, "STABLE"),
        }
    }
}

/// One projected day of the OEE forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Projected OEE, clamped to [0, 100]
    pub predicted_oee: f64,
}

/// Fitted trend and forward projection for a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReport {
    pub historical_average: f64,
    pub trend: TrendDirection,
    /// Goodness of fit (R²); defined as 0 when total variance is zero
    pub trend_strength: f64,
    /// OLS slope in OEE points per day
    pub daily_change: f64,
    /// OLS intercept at day index zero
    pub intercept: f64,
    pub forecast: Vec<ForecastPoint>,
}

/// Trend analysis outcome. Too few distinct days is an expected, recoverable
/// condition surfaced as a value rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrendAnalysis {
    InsufficientData {
        days_available: usize,
        days_required: usize,
    },
    Forecast(TrendReport),
}

// ============================================================================
// Alert Output
// ============================================================================

/// Alert payload, discriminated by how the underlying anomalies grouped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// Three or more anomalies for one asset at one severity
    MultipleAnomalies {
        count: usize,
        /// Distinct metrics involved, in metric order
        metrics: Vec<OeeMetric>,
    },
    /// A lone HIGH or CRITICAL anomaly
    SingleAnomaly {
        metric: OeeMetric,
        value: f64,
        expected: f64,
    },
}

/// Actionable alert produced by grouping raw anomalies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub asset_id: String,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: AlertKind,
    /// Recommended operator action
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_rank_orders_by_level_not_label() {
        // Alphabetically CRITICAL < HIGH < LOW < MEDIUM; the rank must not
        // follow the label.
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_serializes_uppercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    #[test]
    fn oee_metric_labels() {
        assert_eq!(OeeMetric::Oee.to_string(), "OEE");
        assert_eq!(OeeMetric::Availability.to_string(), "Availability");
    }

    #[test]
    fn time_range_duration() {
        use chrono::TimeZone;
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        );
        assert_eq!(range.duration_minutes(), 480.0);
    }
}
