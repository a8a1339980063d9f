//! Sled-backed TTL cache
//!
//! JSON entries carrying their own expiry stamp; expired entries are
//! evicted lazily on read. Sled flushes in the background; losing the last
//! few writes on a crash only re-derives a default on the next lookup.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::IdealCycleCache;
use crate::error::CacheError;

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    value: f64,
    /// Unix seconds after which the entry is dead
    expires_at: i64,
}

/// Local persistent TTL cache over a sled tree.
#[derive(Clone)]
pub struct SledCache {
    db: Arc<sled::Db>,
}

impl SledCache {
    /// Open or create the cache at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl IdealCycleCache for SledCache {
    async fn get(&self, key: &str) -> Result<Option<f64>, CacheError> {
        let Some(raw) = self.db.get(key)? else {
            return Ok(None);
        };
        let entry: Entry = serde_json::from_slice(&raw)?;

        if entry.expires_at <= Utc::now().timestamp() {
            debug!(key, "cache entry expired, evicting");
            self.db.remove(key)?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    async fn put(&self, key: &str, value: f64, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Utc::now().timestamp() + ttl.as_secs() as i64,
        };
        self.db.insert(key, serde_json::to_vec(&entry)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ideal_cycle_time_key;

    #[tokio::test]
    async fn round_trip_and_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SledCache::open(dir.path().join("cycle_cache")).unwrap();
        let key = ideal_cycle_time_key("PRESS-01");

        assert_eq!(cache.get(&key).await.unwrap(), None);

        cache
            .put(&key, 0.75, Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(0.75));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SledCache::open(dir.path().join("cycle_cache")).unwrap();

        cache
            .put("ideal_cycle_time:OLD", 2.0, Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(cache.get("ideal_cycle_time:OLD").await.unwrap(), None);
    }
}
