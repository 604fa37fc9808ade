use std::sync::Arc;
use std::time::Duration;

use object_store::{
    KvDatabase, PresignerClient, SignerConfig, StaticSigner, Storage, UrlSigner,
};

use crate::auth::{GithubVerifier, IdentityVerifier, PolicyCache, TokenVerifier};
use crate::cache::ResolutionCache;
use crate::config::{Config, SIGNED_URL_EXPIRY};
use crate::locate::Locator;
use crate::registry::Registry;

/// Shared service state, cheap to clone into request handlers.
///
/// Cache objects are constructed exactly once here, with their TTLs
/// injected, and shared by reference across concurrently handled
/// requests.
#[derive(Clone)]
pub struct State {
    inner: Arc<StateInner>,
}

struct StateInner {
    primary: Storage,
    signer: Arc<dyn UrlSigner>,
    kv: KvDatabase,
    locator: Locator,
    policy: PolicyCache,
    registry: Registry,
    identity: IdentityVerifier,
    max_object_size: u64,
    signed_url_expiry: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("storage setup failed: {0}")]
    Storage(#[from] object_store::StoreError),

    #[error("identity provider setup failed: {0}")]
    IdentityProvider(String),
}

impl State {
    /// Build state from runtime configuration.
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let primary = Storage::new(config.primary_store.clone()).await?;
        let fallback = match &config.fallback_store {
            Some(fallback_config) => Some(Storage::new(fallback_config.clone()).await?),
            None => None,
        };

        let kv = match &config.sqlite_path {
            Some(path) => KvDatabase::new(path).await?,
            None => KvDatabase::in_memory().await?,
        };

        let signer: Arc<dyn UrlSigner> = match &config.signer {
            SignerConfig::Presigner {
                endpoint,
                access_key,
                secret_key,
                region,
                bucket,
            } => Arc::new(PresignerClient::new(
                endpoint,
                access_key.clone(),
                secret_key.clone(),
                region.clone(),
                bucket.clone(),
                config.upstream_timeout,
            )?),
            SignerConfig::Static { base_url } => Arc::new(StaticSigner::new(base_url)?),
        };

        let provider: Arc<dyn TokenVerifier> = Arc::new(
            GithubVerifier::new(GithubVerifier::DEFAULT_API_BASE, config.upstream_timeout)
                .map_err(|e| StateSetupError::IdentityProvider(e.to_string()))?,
        );

        Ok(Self::new(
            primary,
            fallback,
            signer,
            kv,
            provider,
            config.cache,
            config.max_object_size,
        ))
    }

    /// Assemble state from already-built parts.
    pub fn new(
        primary: Storage,
        fallback: Option<Storage>,
        signer: Arc<dyn UrlSigner>,
        kv: KvDatabase,
        provider: Arc<dyn TokenVerifier>,
        cache: crate::config::CacheConfig,
        max_object_size: u64,
    ) -> Self {
        let resolution_cache =
            ResolutionCache::new(kv.clone(), cache.resolution_ttl, cache.local_capacity);
        let locator = Locator::new(
            primary.clone(),
            fallback,
            signer.clone(),
            resolution_cache,
            SIGNED_URL_EXPIRY,
        );
        let policy = PolicyCache::new(primary.clone(), cache.policy_ttl);
        let registry = Registry::new(primary.clone(), cache.registry_ttl, cache.local_capacity);
        let identity = IdentityVerifier::new(provider, cache.token_ttl, cache.local_capacity);

        Self {
            inner: Arc::new(StateInner {
                primary,
                signer,
                kv,
                locator,
                policy,
                registry,
                identity,
                max_object_size,
                signed_url_expiry: SIGNED_URL_EXPIRY,
            }),
        }
    }

    pub fn primary(&self) -> &Storage {
        &self.inner.primary
    }

    pub fn signer(&self) -> &Arc<dyn UrlSigner> {
        &self.inner.signer
    }

    pub fn kv(&self) -> &KvDatabase {
        &self.inner.kv
    }

    pub fn locator(&self) -> &Locator {
        &self.inner.locator
    }

    pub fn policy(&self) -> &PolicyCache {
        &self.inner.policy
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn identity(&self) -> &IdentityVerifier {
        &self.inner.identity
    }

    pub fn max_object_size(&self) -> u64 {
        self.inner.max_object_size
    }

    pub fn signed_url_expiry(&self) -> Duration {
        self.inner.signed_url_expiry
    }
}
