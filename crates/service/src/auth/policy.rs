//! Authorization policy: fetch, cache, and gate.

use std::time::Duration;

use common::records::AuthorizationPolicy;
use object_store::Storage;

use crate::cache::LocalCache;

/// Store key of the authorization policy document.
pub const POLICY_OBJECT_KEY: &str = "settings/authorization.yaml";

const POLICY_CACHE_KEY: &str = "main";

/// Failures loading the authorization policy.
///
/// Any of these is fatal to an operation requiring a policy decision:
/// the gateway fails closed rather than defaulting to permissive or
/// stale-beyond-TTL behavior.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to fetch authorization policy: {0}")]
    Fetch(#[from] object_store::StoreError),

    #[error("authorization policy document is missing from the store")]
    Missing,

    #[error("authorization policy document is malformed: {0}")]
    Malformed(String),
}

/// TTL-cached view of the authorization policy document.
///
/// The source of truth is a YAML document in the primary store; this
/// cache only trims redundant fetches inside the TTL window.
pub struct PolicyCache {
    storage: Storage,
    cache: LocalCache<AuthorizationPolicy>,
}

impl PolicyCache {
    pub fn new(storage: Storage, ttl: Duration) -> Self {
        Self {
            storage,
            // a single well-known key lives here; capacity is nominal
            cache: LocalCache::new(4, ttl),
        }
    }

    /// Return the cached policy if fresh, otherwise fetch, validate, and
    /// cache it.
    pub async fn get(&self) -> Result<AuthorizationPolicy, PolicyError> {
        if let Some(policy) = self.cache.get(POLICY_CACHE_KEY) {
            return Ok(policy);
        }

        let bytes = self
            .storage
            .get(POLICY_OBJECT_KEY)
            .await?
            .ok_or(PolicyError::Missing)?;
        let policy: AuthorizationPolicy = serde_yaml::from_slice(&bytes)
            .map_err(|e| PolicyError::Malformed(e.to_string()))?;

        self.cache.insert(POLICY_CACHE_KEY, policy.clone());
        Ok(policy)
    }
}
