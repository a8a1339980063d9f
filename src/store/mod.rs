//! Time-series query layer
//!
//! The analytics engine never touches SQL directly: every analysis consumes
//! strongly-typed row structs produced here, at the query boundary. The
//! [`TelemetryStore`] trait is the seam: production code uses the Postgres
//! implementation in [`postgres`], tests inject in-memory fakes.
//!
//! A store handle is owned by (or pooled for) a single logical request;
//! the engine itself holds no connection state beyond the injected handle.

mod postgres;

pub use postgres::{create_pool, PgStore};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TimeRange;

// ============================================================================
// Row Types
// ============================================================================

/// One OEE-aggregate sample for an asset, as written by the OEE pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub asset_id: String,
    pub oee: f64,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
}

/// Per-asset mean/stddev of the OEE sub-metrics over a historical window.
///
/// `STDDEV` is NULL for a single-row group; a `None` here disables the
/// z-score check for that metric rather than erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineStats {
    pub asset_id: String,
    pub avg_oee: f64,
    pub std_oee: Option<f64>,
    pub avg_availability: f64,
    pub std_availability: Option<f64>,
    pub avg_performance: f64,
    pub std_performance: Option<f64>,
    pub avg_quality: f64,
    pub std_quality: Option<f64>,
}

/// Raw telemetry row as consumed by the pattern detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRow {
    pub timestamp: DateTime<Utc>,
    pub oee: f64,
    pub runtime: f64,
    pub downtime: f64,
    pub good_count: i64,
    pub reject_count: i64,
}

/// Telemetry row qualifying for multivariate analysis.
///
/// Temperature, pressure, and vibration are guaranteed non-null by the
/// query; OEE and motor current may be missing and are imputed with the
/// column mean by the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub asset_id: String,
    pub oee: Option<f64>,
    pub temperature: f64,
    pub pressure: f64,
    pub vibration: f64,
    pub current: Option<f64>,
}

/// Summed telemetry totals for one asset over a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetTotals {
    pub asset_id: String,
    pub line_id: String,
    pub runtime: f64,
    pub downtime: f64,
    pub good_count: i64,
    pub reject_count: i64,
    /// Window-average temperature, carried as operator context
    pub avg_temperature: Option<f64>,
    /// Window-average vibration, carried as operator context
    pub avg_vibration: Option<f64>,
}

/// Loss cause grouped by (category, subcategory, reason), duration-summed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossRow {
    pub category: String,
    pub subcategory: String,
    pub reason: String,
    pub duration: f64,
    pub impact: f64,
    pub occurrences: i64,
}

/// Daily average OEE for a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyOee {
    pub date: NaiveDate,
    pub avg_oee: f64,
}

// ============================================================================
// Store Trait
// ============================================================================

/// The logical queries the analytics engine issues against the time-series
/// store. One method per analysis; each returns fully-mapped row structs.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// OEE-aggregate samples for a line over a recent window, ordered by
    /// timestamp ascending.
    async fn recent_oee_samples(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<MetricSample>, sqlx::Error>;

    /// Per-asset mean/stddev of the OEE sub-metrics over a historical window.
    async fn baseline_stats(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<BaselineStats>, sqlx::Error>;

    /// Ordered telemetry rows for one asset, for pattern-rule evaluation.
    async fn pattern_window(
        &self,
        asset_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<PatternRow>, sqlx::Error>;

    /// Ordered telemetry rows for a line with non-null temperature,
    /// pressure, and vibration, for multivariate analysis.
    async fn feature_window(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<FeatureRow>, sqlx::Error>;

    /// Summed runtime/downtime/counts for one asset. `None` when the window
    /// holds no rows for the asset at all.
    async fn asset_totals(
        &self,
        asset_id: &str,
        range: &TimeRange,
    ) -> Result<Option<AssetTotals>, sqlx::Error>;

    /// Loss rows for a line, grouped and ordered by total duration
    /// descending.
    async fn loss_rows(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<LossRow>, sqlx::Error>;

    /// Daily average OEE for a line over a history window, ordered by date.
    async fn daily_oee(
        &self,
        line_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<DailyOee>, sqlx::Error>;
}
