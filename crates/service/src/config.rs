use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use object_store::{SignerConfig, StorageConfig};

/// Maximum permitted object size in bytes (5 GB), enforced at both
/// initiate (declared) and finalize (observed) time.
pub const DEFAULT_MAX_OBJECT_SIZE: u64 = 5_000_000_000;

/// Expiry for signed download and upload URLs.
pub const SIGNED_URL_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// TTL for cached resolution records (both tiers).
pub const DEFAULT_RESOLUTION_TTL: Duration = Duration::from_secs(30 * 60);

/// TTL for the cached authorization policy.
pub const DEFAULT_POLICY_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for cached access-token verifications.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// TTL for cached client/resource registry records.
pub const DEFAULT_REGISTRY_TTL: Duration = Duration::from_secs(60);

/// Entry bound for each process-local cache tier.
pub const DEFAULT_LOCAL_CACHE_CAPACITY: u64 = 10_000;

/// Cache TTLs, injected into the cache objects at construction.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub resolution_ttl: Duration,
    pub policy_ttl: Duration,
    pub token_ttl: Duration,
    pub registry_ttl: Duration,
    pub local_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            resolution_ttl: DEFAULT_RESOLUTION_TTL,
            policy_ttl: DEFAULT_POLICY_TTL,
            token_ttl: DEFAULT_TOKEN_TTL,
            registry_ttl: DEFAULT_REGISTRY_TTL,
            local_capacity: DEFAULT_LOCAL_CACHE_CAPACITY,
        }
    }
}

/// Runtime configuration for the gateway service.
#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Address for the API server to listen on
    pub listen_addr: SocketAddr,

    // storage configuration
    /// Primary content store
    pub primary_store: StorageConfig,
    /// Optional fallback store, consulted only when content is absent
    /// from the primary and the operation permits fallback
    pub fallback_store: Option<StorageConfig>,
    /// Signed URL issuance backend
    pub signer: SignerConfig,
    /// Path to the durable cache database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // limits and TTLs
    pub max_object_size: u64,
    pub cache: CacheConfig,
    /// Optional timeout applied to outbound HTTP calls (signer, identity
    /// provider). No timeout is enforced when unset.
    pub upstream_timeout: Option<Duration>,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
