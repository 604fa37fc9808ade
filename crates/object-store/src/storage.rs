//! Object storage backend abstraction (S3/MinIO/local filesystem/memory).

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Configuration for an object storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

impl StorageConfig {
    /// Stable identity of the configured store.
    ///
    /// Cache keys are scoped by this value, so two deployments pointing at
    /// different buckets never share resolution entries.
    pub fn uri(&self) -> String {
        match self {
            StorageConfig::Memory => "memory://".to_string(),
            StorageConfig::Local { path } => format!("file://{}", path.display()),
            StorageConfig::S3 { bucket, .. } => format!("s3://{}", bucket),
        }
    }
}

/// Result of a head probe: the object exists and has this size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: u64,
}

/// Wrapper around different object storage backends.
#[derive(Debug, Clone)]
pub struct Storage {
    inner: Arc<dyn ObjectStore>,
    uri: String,
}

impl Storage {
    /// Create a new storage backend from configuration.
    pub async fn new(config: StorageConfig) -> Result<Self> {
        let uri = config.uri();
        let inner: Arc<dyn ObjectStore> = match &config {
            StorageConfig::Memory => Arc::new(InMemory::new()),

            StorageConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                )
            }

            StorageConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"));

                let store: Arc<dyn ObjectStore> = Arc::new(
                    builder
                        .build()
                        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                );

                // Verify bucket exists by listing (empty prefix)
                // This will fail fast if the bucket doesn't exist
                {
                    use futures::TryStreamExt;
                    let prefix = ObjectPath::from("");
                    let mut stream = store.list(Some(&prefix));
                    match stream.try_next().await {
                        Ok(_) => {} // Bucket exists (may or may not have items)
                        Err(object_store::Error::NotFound { .. }) => {
                            return Err(StoreError::BucketNotFound(bucket.clone()));
                        }
                        Err(e) => {
                            // Check if error message indicates bucket doesn't exist
                            let msg = e.to_string();
                            if msg.contains("NoSuchBucket")
                                || msg.contains("bucket") && msg.contains("not")
                            {
                                return Err(StoreError::BucketNotFound(bucket.clone()));
                            }
                            return Err(e.into());
                        }
                    }
                }

                store
            }
        };

        Ok(Self { inner, uri })
    }

    /// Create an in-memory storage backend.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
            uri: StorageConfig::Memory.uri(),
        }
    }

    /// Stable identity of this store, used to scope cache keys.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Probe an object for existence and size.
    pub async fn head(&self, key: &str) -> Result<Option<ObjectHead>> {
        let path = ObjectPath::from(key);
        match self.inner.head(&path).await {
            Ok(meta) => Ok(Some(ObjectHead {
                size: meta.size as u64,
            })),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read an object's bytes.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let path = ObjectPath::from(key);
        match self.inner.get(&path).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(bytes))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write an object.
    pub async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = ObjectPath::from(key);
        let size = data.len();
        self.inner.put(&path, data.into()).await?;
        tracing::debug!(key = %key, size = size, "object stored");
        Ok(())
    }

    /// Delete an object.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = ObjectPath::from(key);
        // Ignore NotFound errors - the object may already be deleted
        match self.inner.delete(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "object deleted");
                Ok(())
            }
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = Storage::memory();

        let key = "sha1/ab/cd/ef/abcdef0123456789abcdef0123456789abcdef01";
        let data = Bytes::from("hello world");

        storage.put(key, data.clone()).await.unwrap();
        let retrieved = storage.get(key).await.unwrap().unwrap();
        assert_eq!(retrieved, data);

        let head = storage.head(key).await.unwrap().unwrap();
        assert_eq!(head.size, data.len() as u64);

        storage.delete(key).await.unwrap();
        assert!(storage.head(key).await.unwrap().is_none());
        assert!(storage.get(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_head_absent_is_none_not_error() {
        let storage = Storage::memory();
        assert!(storage.head("settings/nope.yaml").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let storage = Storage::memory();
        storage.delete("never/existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_storage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::Local {
            path: temp_dir.path().to_path_buf(),
        };

        let storage = Storage::new(config).await.unwrap();

        let key = "clients/def456";
        let data = Bytes::from("test data");

        storage.put(key, data.clone()).await.unwrap();
        let retrieved = storage.get(key).await.unwrap().unwrap();
        assert_eq!(retrieved, data);

        // Verify file exists on disk
        let file_path = temp_dir.path().join("clients").join("def456");
        assert!(file_path.exists());
    }

    #[test]
    fn test_config_uri_identity() {
        assert_eq!(StorageConfig::Memory.uri(), "memory://");
        let s3 = StorageConfig::S3 {
            endpoint: "http://localhost:9000".into(),
            access_key: "ak".into(),
            secret_key: "sk".into(),
            bucket: "content".into(),
            region: None,
        };
        assert_eq!(s3.uri(), "s3://content");
    }
}
