//! In-memory TTL cache for tests and embedded use

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::IdealCycleCache;
use crate::error::CacheError;

/// Process-local cache; entries die with the process.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (f64, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdealCycleCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<f64>, CacheError> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.get(key) {
            Some((value, deadline)) if *deadline > Instant::now() => Ok(Some(*value)),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: f64, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ttl_is_honored() {
        let cache = MemoryCache::new();
        cache
            .put("ideal_cycle_time:A1", 1.5, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("ideal_cycle_time:A1").await.unwrap(), Some(1.5));

        cache
            .put("ideal_cycle_time:A2", 1.5, Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(cache.get("ideal_cycle_time:A2").await.unwrap(), None);
    }
}
