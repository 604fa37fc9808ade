//! Error types for the storage backends.

/// Errors that can occur when working with the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Outbound HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Bucket not found - must be created before use
    #[error("bucket '{0}' does not exist. Create it before starting the gateway.")]
    BucketNotFound(String),

    /// URL signer failure
    #[error("signer error: {0}")]
    Signer(String),
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
