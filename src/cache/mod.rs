//! Ideal-cycle-time cache
//!
//! The only cross-call state in the system: a per-asset ideal cycle time
//! memoized under `ideal_cycle_time:<asset_id>` with a TTL. On a miss the
//! engine writes back the configured default; concurrent first-time lookups
//! may race to write it, which is benign (idempotent write of the same
//! value).
//!
//! [`SledCache`] is the durable local backend; [`MemoryCache`] backs tests
//! and embedded use.

mod local;
mod memory;

pub use local::SledCache;
pub use memory::MemoryCache;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CacheError;

/// Cache key for an asset's ideal cycle time.
pub fn ideal_cycle_time_key(asset_id: &str) -> String {
    format!("ideal_cycle_time:{asset_id}")
}

/// Key-value cache with expiry, as consumed by the OEE calculator.
#[async_trait]
pub trait IdealCycleCache: Send + Sync {
    /// Fetch a live value. Expired or absent entries return `None`.
    async fn get(&self, key: &str) -> Result<Option<f64>, CacheError>;

    /// Store a value with a time-to-live.
    async fn put(&self, key: &str, value: f64, ttl: Duration) -> Result<(), CacheError>;
}

#[async_trait]
impl<T: IdealCycleCache + ?Sized> IdealCycleCache for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<f64>, CacheError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: f64, ttl: Duration) -> Result<(), CacheError> {
        (**self).put(key, value, ttl).await
    }
}
