//! Loss Analytics: statistical intelligence for production telemetry
//!
//! Batch analytics over a manufacturing time-series store:
//!
//! - **Baseline + Univariate Detection**: per-asset mean/stddev baselines
//!   and z-score anomaly checks on the OEE sub-metrics
//! - **Pattern Detection**: sudden-drop, rising-reject, and downtime
//!   threshold rules over raw telemetry
//! - **Multivariate Detection**: Mahalanobis distance over a five-feature
//!   vector
//! - **OEE Calculation**: availability / performance / quality and the
//!   composite, from summed counts and durations
//! - **Loss Pareto Analysis**: ranked loss causes, vital few, and
//!   remediation recommendations
//! - **Trend Forecasting**: OLS fit of daily OEE with forward projection
//! - **Alert Aggregation**: grouping raw anomalies into operator alerts
//!
//! Everything is a stateless batch computation over an explicit window; the
//! only cross-call state is the per-asset ideal-cycle-time cache entry.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;

// Re-export the engine and its collaborator seams
pub use cache::{IdealCycleCache, MemoryCache, SledCache};
pub use config::AnalyticsConfig;
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, CacheError};
pub use store::{PgStore, TelemetryStore};

// Re-export commonly used types
pub use types::{
    Alert, AlertKind, Anomaly, LossAnalysis, LossParetoReport, MultivariateObservation,
    OeeMetric, OeeRecord, ParetoEntry, PatternEvent, PatternKind, Severity, TimeRange,
    TrendAnalysis, TrendDirection, TrendReport,
};
