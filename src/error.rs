//! Error types for the analytics engine
//!
//! Hard failures only. Sparse-data conditions (too few rows for a pattern
//! window, no recorded losses, too few days for a trend fit) are expected
//! outcomes and are modeled as values, not errors. Query-layer and cache
//! failures propagate to the caller, which owns retry policy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// OEE was requested for an asset/window with zero matching rows.
    /// Distinct from metrics that are legitimately zero.
    #[error("no telemetry found for asset {asset_id} in the requested window")]
    NoData { asset_id: String },

    /// The feature covariance matrix could not be pseudo-inverted.
    /// Distinguishes "analysis could not be performed" from "no anomalies".
    #[error("covariance matrix could not be inverted: {0}")]
    CovarianceNotInvertible(String),

    #[error("query layer error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Failures from the ideal-cycle-time cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("cache entry could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}
