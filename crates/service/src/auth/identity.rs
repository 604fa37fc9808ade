//! Principal resolution from request identity claims.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use common::crypto::{NodeId, Signature};
use common::principal::Principal;

use crate::cache::LocalCache;

/// Rejections produced while establishing a request's identity.
///
/// All of these are hard failures surfaced before any store access.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("request carries both node and user identities")]
    BothIdentities,

    #[error("no signature supplied for claimed node identity")]
    MissingSignature,

    #[error("invalid signature for claimed node identity")]
    InvalidSignature,

    #[error("no access token supplied for claimed user identity")]
    MissingAccessToken,

    #[error("access token does not belong to claimed user id")]
    TokenMismatch,

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("operation requires an authenticated identity")]
    MissingIdentity,

    #[error("node {0} is not registered")]
    UnknownClient(NodeId),
}

/// Identity material carried by a request. Every field is optional; which
/// combinations are acceptable is decided by [`IdentityVerifier::resolve`].
#[derive(Debug, Clone, Default)]
pub struct IdentityClaims {
    pub node_id: Option<NodeId>,
    pub signature: Option<Signature>,
    pub user_id: Option<String>,
    pub access_token: Option<String>,
}

/// Confirms that an access token belongs to some external account,
/// returning that account's user id.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    async fn lookup_user(&self, access_token: &str) -> Result<String, IdentityError>;
}

/// [`TokenVerifier`] backed by the GitHub API: the token's owner is
/// whoever `GET /user` says it is.
pub struct GithubVerifier {
    http: reqwest::Client,
    api_base: Url,
}

impl GithubVerifier {
    pub const DEFAULT_API_BASE: &'static str = "https://api.github.com";

    pub fn new(api_base: &str, timeout: Option<Duration>) -> Result<Self, IdentityError> {
        let api_base =
            Url::parse(api_base).map_err(|e| IdentityError::Provider(e.to_string()))?;
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "hashgate/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| IdentityError::Provider(e.to_string()))?;
        Ok(Self { http, api_base })
    }
}

#[derive(Debug, serde::Deserialize)]
struct GithubUser {
    login: String,
}

#[async_trait]
impl TokenVerifier for GithubVerifier {
    async fn lookup_user(&self, access_token: &str) -> Result<String, IdentityError> {
        let endpoint = self
            .api_base
            .join("/user")
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        let response = self
            .http
            .get(endpoint)
            .header("Authorization", format!("token {}", access_token))
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Provider(format!(
                "identity provider returned status {}",
                response.status()
            )));
        }

        let user: GithubUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;
        Ok(user.login)
    }
}

/// [`TokenVerifier`] with a fixed token-to-user table, for dev and tests.
/// Counts provider lookups so caching behavior can be asserted on.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
    pub lookups: AtomicUsize,
}

impl StaticTokenVerifier {
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn lookup_user(&self, access_token: &str) -> Result<String, IdentityError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| IdentityError::Provider("unknown access token".to_string()))
    }
}

/// Resolves a request's identity claims into at most one [`Principal`].
pub struct IdentityVerifier {
    provider: Arc<dyn TokenVerifier>,
    /// Verified token -> user id, to avoid redundant provider round-trips
    token_cache: LocalCache<String>,
}

impl IdentityVerifier {
    pub fn new(provider: Arc<dyn TokenVerifier>, token_ttl: Duration, capacity: u64) -> Self {
        Self {
            provider,
            token_cache: LocalCache::new(capacity, token_ttl),
        }
    }

    /// Resolve the claims carried by a request against `payload`, the
    /// exact payload the signature (if any) was computed over.
    ///
    /// Exactly zero or one principal may be established. A claimed
    /// identity with missing or invalid proof is a hard rejection, as is
    /// claiming both kinds at once.
    pub async fn resolve(
        &self,
        payload: &Value,
        claims: &IdentityClaims,
    ) -> Result<Option<Principal>, IdentityError> {
        if claims.node_id.is_some() && claims.user_id.is_some() {
            return Err(IdentityError::BothIdentities);
        }

        if let Some(node_id) = &claims.node_id {
            let signature = claims
                .signature
                .as_ref()
                .ok_or(IdentityError::MissingSignature)?;
            node_id
                .verify_payload(payload, signature)
                .map_err(|_| IdentityError::InvalidSignature)?;
            return Ok(Some(Principal::node(node_id.clone())));
        }

        if let Some(user_id) = &claims.user_id {
            let token = claims
                .access_token
                .as_ref()
                .ok_or(IdentityError::MissingAccessToken)?;
            let verified = self.verify_token(token).await?;
            if &verified != user_id {
                return Err(IdentityError::TokenMismatch);
            }
            return Ok(Some(Principal::user(user_id.clone())));
        }

        Ok(None)
    }

    /// Like [`resolve`](Self::resolve), but an unauthenticated request is
    /// a rejection.
    pub async fn require(
        &self,
        payload: &Value,
        claims: &IdentityClaims,
    ) -> Result<Principal, IdentityError> {
        self.resolve(payload, claims)
            .await?
            .ok_or(IdentityError::MissingIdentity)
    }

    async fn verify_token(&self, access_token: &str) -> Result<String, IdentityError> {
        if let Some(user_id) = self.token_cache.get(access_token) {
            return Ok(user_id);
        }
        let user_id = self.provider.lookup_user(access_token).await?;
        self.token_cache.insert(access_token, user_id.clone());
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::crypto::SecretKey;
    use serde_json::json;

    fn verifier_with(tokens: &[(&str, &str)]) -> (IdentityVerifier, Arc<StaticTokenVerifier>) {
        let provider = Arc::new(StaticTokenVerifier::new(
            tokens
                .iter()
                .map(|(t, u)| (t.to_string(), u.to_string())),
        ));
        let verifier = IdentityVerifier::new(
            provider.clone(),
            Duration::from_secs(30 * 60),
            100,
        );
        (verifier, provider)
    }

    #[tokio::test]
    async fn test_no_claims_resolves_to_none() {
        let (verifier, _) = verifier_with(&[]);
        let principal = verifier
            .resolve(&json!({}), &IdentityClaims::default())
            .await
            .unwrap();
        assert!(principal.is_none());

        assert!(matches!(
            verifier.require(&json!({}), &IdentityClaims::default()).await,
            Err(IdentityError::MissingIdentity)
        ));
    }

    #[tokio::test]
    async fn test_node_identity_requires_valid_signature() {
        let (verifier, _) = verifier_with(&[]);
        let secret = SecretKey::generate();
        let node_id = NodeId::from(&secret.public());
        let payload = json!({"timestamp": 1, "hash": "aa"});

        // missing signature
        let claims = IdentityClaims {
            node_id: Some(node_id.clone()),
            ..Default::default()
        };
        assert!(matches!(
            verifier.resolve(&payload, &claims).await,
            Err(IdentityError::MissingSignature)
        ));

        // valid signature
        let claims = IdentityClaims {
            node_id: Some(node_id.clone()),
            signature: Some(secret.sign_payload(&payload)),
            ..Default::default()
        };
        assert_eq!(
            verifier.resolve(&payload, &claims).await.unwrap(),
            Some(Principal::node(node_id.clone()))
        );

        // signature over a different payload
        let claims = IdentityClaims {
            node_id: Some(node_id),
            signature: Some(secret.sign_payload(&json!({"timestamp": 2}))),
            ..Default::default()
        };
        assert!(matches!(
            verifier.resolve(&payload, &claims).await,
            Err(IdentityError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_user_identity_requires_matching_token() {
        let (verifier, _) = verifier_with(&[("tok-alice", "alice")]);

        let claims = IdentityClaims {
            user_id: Some("alice".into()),
            access_token: Some("tok-alice".into()),
            ..Default::default()
        };
        assert_eq!(
            verifier.resolve(&json!({}), &claims).await.unwrap(),
            Some(Principal::user("alice"))
        );

        // token belongs to someone else
        let claims = IdentityClaims {
            user_id: Some("bob".into()),
            access_token: Some("tok-alice".into()),
            ..Default::default()
        };
        assert!(matches!(
            verifier.resolve(&json!({}), &claims).await,
            Err(IdentityError::TokenMismatch)
        ));

        // no token at all
        let claims = IdentityClaims {
            user_id: Some("alice".into()),
            ..Default::default()
        };
        assert!(matches!(
            verifier.resolve(&json!({}), &claims).await,
            Err(IdentityError::MissingAccessToken)
        ));
    }

    #[tokio::test]
    async fn test_both_identity_kinds_rejected() {
        let (verifier, _) = verifier_with(&[("tok-alice", "alice")]);
        let secret = SecretKey::generate();
        let payload = json!({"timestamp": 1});

        let claims = IdentityClaims {
            node_id: Some(NodeId::from(&secret.public())),
            signature: Some(secret.sign_payload(&payload)),
            user_id: Some("alice".into()),
            access_token: Some("tok-alice".into()),
        };
        assert!(matches!(
            verifier.resolve(&payload, &claims).await,
            Err(IdentityError::BothIdentities)
        ));
    }

    #[tokio::test]
    async fn test_token_verifications_are_cached() {
        let (verifier, provider) = verifier_with(&[("tok-alice", "alice")]);
        let claims = IdentityClaims {
            user_id: Some("alice".into()),
            access_token: Some("tok-alice".into()),
            ..Default::default()
        };

        for _ in 0..3 {
            verifier.resolve(&json!({}), &claims).await.unwrap();
        }
        assert_eq!(provider.lookups.load(Ordering::Relaxed), 1);
    }
}
