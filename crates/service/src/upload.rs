//! The upload orchestrator: initiate and finalize brokered uploads.
//!
//! An upload moves through `initiate` (signed PUT URL issued) to
//! `finalize` (stored object checked against the declaration), with an
//! already-exists shortcut when the content is resolvable. There is no
//! cross-request lock between two concurrent sequences for identical
//! content: the canonical key is content-derived and the end state is
//! idempotent.

use common::content::ContentLocator;
use common::principal::Principal;
use url::Url;

use crate::auth::{IdentityError, PolicyError};
use crate::registry::RegistryError;
use crate::service_state::State;
use object_store::SignedUrlOperation;

/// Rejections and failures of the upload operations.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("declared size {size} exceeds the maximum object size {max}")]
    SizeLimit { size: u64, max: u64 },

    #[error("stored object size {observed} does not match declared size {declared}")]
    SizeMismatch { observed: u64, declared: u64 },

    #[error("uploaded object was not found in the primary store")]
    MissingObject,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("user {0} is not authorized to upload")]
    NotAuthorized(String),

    #[error("authorization policy unavailable: {0}")]
    PolicyUnavailable(#[from] PolicyError),

    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// Outcome of an initiate call.
#[derive(Debug, Clone, PartialEq)]
pub enum InitiateOutcome {
    /// The content is already resolvable; no URL is issued.
    AlreadyExists,
    /// The upload may proceed against the signed PUT URL.
    Pending {
        object_key: String,
        signed_upload_url: Url,
    },
}

/// Resolve the effective owner the policy gate applies to.
///
/// A user identity is its own owner; a node identity maps to its
/// registered client's owner. An authenticated but unregistered node
/// cannot be mapped to an owner and is rejected.
async fn effective_owner(state: &State, principal: &Principal) -> Result<String, UploadError> {
    match principal {
        Principal::User { user_id } => Ok(user_id.clone()),
        Principal::Node { node_id } => match state.registry().get_client(node_id).await {
            Ok(client) => Ok(client.owner_id),
            Err(RegistryError::NotFound) => {
                Err(IdentityError::UnknownClient(node_id.clone()).into())
            }
            Err(e) => Err(UploadError::Upstream(e.to_string())),
        },
    }
}

/// Check the policy gate for `owner`, failing closed when the policy
/// cannot be loaded.
async fn require_upload_right(state: &State, owner: &str) -> Result<(), UploadError> {
    let policy = state.policy().get().await?;
    if !policy.allows_upload(owner) {
        return Err(UploadError::NotAuthorized(owner.to_string()));
    }
    Ok(())
}

/// Initiate an upload: gate it, dedup it, and issue a signed PUT URL.
///
/// The size cap is enforced before any other work. The dedup pre-check
/// runs with fallback disallowed: a fallback-origin cache hit must never
/// short-circuit an upload.
pub async fn initiate(
    state: &State,
    declared_size: u64,
    content: &ContentLocator,
    principal: Option<&Principal>,
) -> Result<InitiateOutcome, UploadError> {
    let max = state.max_object_size();
    if declared_size > max {
        return Err(UploadError::SizeLimit {
            size: declared_size,
            max,
        });
    }

    let principal = principal.ok_or(IdentityError::MissingIdentity)?;
    let owner = effective_owner(state, principal).await?;
    require_upload_right(state, &owner).await?;

    if state.locator().locate(content, false).await.is_found() {
        tracing::debug!(hash = %content.hash, "upload deduplicated, content already resolvable");
        return Ok(InitiateOutcome::AlreadyExists);
    }

    let object_key = content.object_key();
    let signed_upload_url = state
        .signer()
        .sign(
            SignedUrlOperation::Put,
            &object_key,
            state.signed_url_expiry(),
        )
        .await
        .map_err(|e| UploadError::Upstream(e.to_string()))?;

    tracing::info!(key = %object_key, owner = %owner, size = declared_size, "upload initiated");
    Ok(InitiateOutcome::Pending {
        object_key,
        signed_upload_url,
    })
}

/// Finalize an upload: confirm the object landed and matches its
/// declaration.
///
/// The gateway never retains an object whose server-observed size
/// disagrees with the client's declaration or exceeds the cap; either
/// case deletes the object and fails. The declared content hash is not
/// re-verified against the uploaded bytes (trust-on-first-use).
pub async fn finalize(
    state: &State,
    object_key: &str,
    declared_size: u64,
    principal: Option<&Principal>,
) -> Result<(), UploadError> {
    let principal = principal.ok_or(IdentityError::MissingIdentity)?;
    let owner = effective_owner(state, principal).await?;
    require_upload_right(state, &owner).await?;

    let head = state
        .primary()
        .head(object_key)
        .await
        .map_err(|e| UploadError::Upstream(e.to_string()))?
        .ok_or(UploadError::MissingObject)?;

    if head.size != declared_size {
        tracing::warn!(
            key = %object_key,
            observed = head.size,
            declared = declared_size,
            "deleting object with mismatched size"
        );
        delete_rejected(state, object_key).await;
        return Err(UploadError::SizeMismatch {
            observed: head.size,
            declared: declared_size,
        });
    }

    let max = state.max_object_size();
    if head.size > max {
        tracing::warn!(key = %object_key, size = head.size, "deleting over-limit object");
        delete_rejected(state, object_key).await;
        return Err(UploadError::SizeLimit {
            size: head.size,
            max,
        });
    }

    tracing::info!(key = %object_key, owner = %owner, size = head.size, "upload finalized");
    Ok(())
}

/// Best-effort deletion of a rejected object. A failed delete means the
/// object lingers until the next finalize attempt rejects it again.
async fn delete_rejected(state: &State, object_key: &str) {
    if let Err(e) = state.primary().delete(object_key).await {
        tracing::warn!(key = %object_key, error = %e, "failed to delete rejected object");
    }
}
