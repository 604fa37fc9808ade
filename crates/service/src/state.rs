use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use object_store::{SignerConfig, StorageConfig};

use crate::config::{CacheConfig, Config, DEFAULT_MAX_OBJECT_SIZE};

pub const APP_NAME: &str = "hashgate";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "cache.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the gateway API server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Primary content store
    #[serde(default)]
    pub primary_store: StorageConfig,
    /// Optional fallback store
    #[serde(default)]
    pub fallback_store: Option<StorageConfig>,
    /// Signed URL backend
    #[serde(default = "default_signer")]
    pub signer: SignerConfig,

    /// Maximum permitted object size in bytes
    #[serde(default = "default_max_object_size")]
    pub max_object_size: u64,

    /// Cache TTL overrides, in seconds
    #[serde(default)]
    pub resolution_ttl_secs: Option<u64>,
    #[serde(default)]
    pub policy_ttl_secs: Option<u64>,
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,
    #[serde(default)]
    pub registry_ttl_secs: Option<u64>,

    /// Timeout for outbound HTTP calls in seconds (unset: no timeout)
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for log files (optional, logs to stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_port() -> u16 {
    8080
}

fn default_signer() -> SignerConfig {
    SignerConfig::Static {
        base_url: "http://localhost:8080/signed/".to_string(),
    }
}

fn default_max_object_size() -> u64 {
    DEFAULT_MAX_OBJECT_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            primary_store: StorageConfig::default(),
            fallback_store: None,
            signer: default_signer(),
            max_object_size: default_max_object_size(),
            resolution_ttl_secs: None,
            policy_ttl_secs: None,
            token_ttl_secs: None,
            registry_ttl_secs: None,
            upstream_timeout_secs: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the hashgate directory (~/.hashgate)
    pub app_dir: PathBuf,
    /// Path to the durable cache database
    pub db_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the hashgate directory path (custom or default ~/.hashgate)
    pub fn app_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new hashgate state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if app_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&app_dir)?;

        // Create config (use provided or default)
        let config = config.unwrap_or_default();
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        let db_path = app_dir.join(DB_FILE_NAME);

        Ok(Self {
            app_dir,
            db_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the hashgate directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if !app_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = app_dir.join(DB_FILE_NAME);
        let config_path = app_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            app_dir,
            db_path,
            config_path,
            config,
        })
    }

    /// Build the runtime service configuration.
    pub fn service_config(&self) -> Result<Config, StateError> {
        let config = &self.config;

        let listen_addr = SocketAddr::from_str(&format!("0.0.0.0:{}", config.port))
            .map_err(|e| StateError::InvalidConfig(e.to_string()))?;

        let log_level = tracing::Level::from_str(&config.log_level)
            .map_err(|_| StateError::InvalidConfig(format!("log level: {}", config.log_level)))?;

        let mut cache = CacheConfig::default();
        if let Some(secs) = config.resolution_ttl_secs {
            cache.resolution_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = config.policy_ttl_secs {
            cache.policy_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = config.token_ttl_secs {
            cache.token_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = config.registry_ttl_secs {
            cache.registry_ttl = Duration::from_secs(secs);
        }

        Ok(Config {
            listen_addr,
            primary_store: config.primary_store.clone(),
            fallback_store: config.fallback_store.clone(),
            signer: config.signer.clone(),
            sqlite_path: Some(self.db_path.clone()),
            max_object_size: config.max_object_size,
            cache,
            upstream_timeout: config.upstream_timeout_secs.map(Duration::from_secs),
            log_level,
            log_dir: config.log_dir.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("hashgate directory not initialized. Run 'hashgate init' first")]
    NotInitialized,

    #[error("hashgate directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
