//! Process-local and two-tier caches.
//!
//! Cache objects are constructed once per process with their TTLs
//! injected, then passed by reference to the components needing them.
//! Values are immutable snapshots: concurrent writers may race on which
//! snapshot is visible but never corrupt structure.

use std::time::Duration;

use chrono::Utc;
use moka::sync::Cache;

use common::records::ResolutionRecord;
use object_store::KvDatabase;

/// Bounded process-local TTL cache.
///
/// A thin wrapper over moka with capacity and time-to-live eviction.
/// Volatile: a restart loses it; the durable tier (where present) is the
/// real cross-instance state.
#[derive(Clone)]
pub struct LocalCache<T: Clone + Send + Sync + 'static> {
    inner: Cache<String, T>,
}

impl<T: Clone + Send + Sync + 'static> LocalCache<T> {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.inner.insert(key.into(), value);
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.invalidate(key);
    }
}

/// Two-tier cache for resolution records.
///
/// Tier one is a bounded volatile in-process map; tier two is the shared
/// durable key-value store. Freshness is judged on every read from the
/// record's own creation timestamp, so both tiers apply the same TTL
/// regardless of when an instance first saw the record.
///
/// There is no single-flight guarantee: concurrent misses for the same
/// key may each repopulate the cache; last write wins, which is safe
/// because records are immutable snapshots.
#[derive(Clone)]
pub struct ResolutionCache {
    local: LocalCache<ResolutionRecord>,
    durable: KvDatabase,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(durable: KvDatabase, ttl: Duration, capacity: u64) -> Self {
        Self {
            local: LocalCache::new(capacity, ttl),
            durable,
            ttl,
        }
    }

    /// Look up a fresh record.
    ///
    /// Checks the local tier, then the durable tier. A stale record found
    /// in either tier is purged from both and treated as absent. A
    /// durable-tier hit is returned as-is and is not promoted into the
    /// local tier; the local tier only learns keys through [`put`](Self::put)
    /// on an authoritative re-probe.
    pub async fn get(&self, key: &str) -> Option<ResolutionRecord> {
        let record = match self.local.get(key) {
            Some(record) => Some(record),
            None => self.get_durable(key).await,
        }?;

        if record.is_expired(self.ttl, Utc::now()) {
            tracing::debug!(key = %key, "evicting expired resolution record");
            self.delete(key).await;
            return None;
        }
        Some(record)
    }

    /// Store a record in both tiers. The durable write is synchronous;
    /// its failure is tolerated (a miss just triggers a fresh re-probe)
    /// but logged.
    pub async fn put(&self, key: &str, record: &ResolutionRecord) {
        self.local.insert(key, record.clone());

        match serde_json::to_string(record) {
            Ok(encoded) => {
                if let Err(e) = self.durable.put(key, &encoded).await {
                    tracing::warn!(key = %key, error = %e, "durable cache write failed");
                }
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to encode resolution record");
            }
        }
    }

    /// Remove a record from both tiers.
    pub async fn delete(&self, key: &str) {
        self.local.invalidate(key);
        if let Err(e) = self.durable.delete(key).await {
            tracing::warn!(key = %key, error = %e, "durable cache delete failed");
        }
    }

    async fn get_durable(&self, key: &str) -> Option<ResolutionRecord> {
        let encoded = match self.durable.get(key).await {
            Ok(value) => value?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "durable cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&encoded) {
            Ok(record) => Some(record),
            Err(e) => {
                // an unparseable entry can never become valid again
                tracing::warn!(key = %key, error = %e, "discarding malformed durable cache entry");
                self.delete(key).await;
                None
            }
        }
    }
}
