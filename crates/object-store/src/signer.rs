//! Temporary signed URL issuance.
//!
//! The gateway never serves content bytes over its own API; it hands out
//! time-limited GET/PUT URLs against the object store. Signing is a seam:
//! the reference deployment delegates to an external presigner service,
//! while dev and test environments use a deterministic static signer.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, StoreError};

/// Operation a signed URL grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignedUrlOperation {
    #[serde(rename = "getObject")]
    Get,
    #[serde(rename = "putObject")]
    Put,
}

impl SignedUrlOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignedUrlOperation::Get => "getObject",
            SignedUrlOperation::Put => "putObject",
        }
    }
}

/// Issues temporary URLs for direct store access.
#[async_trait]
pub trait UrlSigner: Send + Sync + 'static {
    /// Sign a URL permitting `operation` on `object_key` for `expires_in`.
    async fn sign(
        &self,
        operation: SignedUrlOperation,
        object_key: &str,
        expires_in: Duration,
    ) -> Result<Url>;
}

/// Configuration for the URL signer backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignerConfig {
    /// Delegate to an external presigner service
    Presigner {
        /// Presigner endpoint (e.g., "https://presigner.example.com")
        endpoint: String,
        /// Credentials and bucket the presigner signs for
        access_key: String,
        secret_key: String,
        region: String,
        bucket: String,
    },

    /// Deterministic URLs rooted at a base (dev/test only; no cryptographic
    /// signing happens)
    Static {
        /// Base URL signed URLs are joined onto
        base_url: String,
    },
}

/// Request body sent to the external presigner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresignRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    operation: SignedUrlOperation,
    access_key_id: &'a str,
    secret_access_key: &'a str,
    region: &'a str,
    bucket_name: &'a str,
    object_key: &'a str,
    expires_sec: u64,
}

#[derive(Debug, Deserialize)]
struct PresignResponse {
    url: Url,
}

/// [`UrlSigner`] delegating to an external presigner service.
pub struct PresignerClient {
    http: reqwest::Client,
    endpoint: Url,
    access_key: String,
    secret_key: String,
    region: String,
    bucket: String,
}

impl PresignerClient {
    pub fn new(
        endpoint: &str,
        access_key: String,
        secret_key: String,
        region: String,
        bucket: String,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StoreError::InvalidConfig(format!("presigner endpoint: {}", e)))?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint,
            access_key,
            secret_key,
            region,
            bucket,
        })
    }
}

#[async_trait]
impl UrlSigner for PresignerClient {
    async fn sign(
        &self,
        operation: SignedUrlOperation,
        object_key: &str,
        expires_in: Duration,
    ) -> Result<Url> {
        let request = PresignRequest {
            kind: "getSignedUrl",
            operation,
            access_key_id: &self.access_key,
            secret_access_key: &self.secret_key,
            region: &self.region,
            bucket_name: &self.bucket,
            object_key,
            expires_sec: expires_in.as_secs(),
        };

        let endpoint = self
            .endpoint
            .join("/api/presign")
            .map_err(|e| StoreError::Signer(e.to_string()))?;

        let response = self.http.post(endpoint).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Signer(format!(
                "presigner returned status {}",
                response.status()
            )));
        }

        let body: PresignResponse = response.json().await?;
        Ok(body.url)
    }
}

/// [`UrlSigner`] producing deterministic unsigned URLs.
///
/// The URL encodes the operation, key, and expiry so tests can assert on
/// them; nothing about it is actually signed.
pub struct StaticSigner {
    base: Url,
}

impl StaticSigner {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| StoreError::InvalidConfig(format!("signer base url: {}", e)))?;
        Ok(Self { base })
    }
}

#[async_trait]
impl UrlSigner for StaticSigner {
    async fn sign(
        &self,
        operation: SignedUrlOperation,
        object_key: &str,
        expires_in: Duration,
    ) -> Result<Url> {
        let mut url = self
            .base
            .join(&format!("{}/{}", operation.as_str(), object_key))
            .map_err(|e| StoreError::Signer(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("expiresSec", &expires_in.as_secs().to_string());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_signer_encodes_operation_and_expiry() {
        let signer = StaticSigner::new("http://localhost:9000/signed/").unwrap();
        let url = signer
            .sign(
                SignedUrlOperation::Put,
                "sha1/ab/cd/ef/abcdef0123456789abcdef0123456789abcdef01",
                Duration::from_secs(3600),
            )
            .await
            .unwrap();

        assert!(url.path().contains("putObject"));
        assert!(url.path().ends_with("abcdef0123456789abcdef0123456789abcdef01"));
        assert_eq!(url.query(), Some("expiresSec=3600"));
    }

    #[test]
    fn test_operation_wire_names() {
        assert_eq!(
            serde_json::to_string(&SignedUrlOperation::Get).unwrap(),
            "\"getObject\""
        );
        assert_eq!(
            serde_json::to_string(&SignedUrlOperation::Put).unwrap(),
            "\"putObject\""
        );
    }
}
