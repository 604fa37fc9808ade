use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::content::{ContentLocator, HashAlg, Sha1Hash};

use crate::auth::IdentityError;
use crate::http_server::api::v0::Envelope;
use crate::upload::{self, UploadError};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizePayload {
    pub timestamp: i64,
    pub object_key: String,
    pub hash_alg: HashAlg,
    pub hash: Sha1Hash,
    pub size: u64,
}

/// Finalize acknowledges with an empty object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<Envelope>,
) -> Result<impl IntoResponse, FinalizeError> {
    let payload: FinalizePayload = req.parse_payload().map_err(FinalizeError::Validation)?;

    // The object key must be canonically shaped; its consistency with the
    // declared hash is not checked, matching the trust-on-first-use model.
    ContentLocator::parse_object_key(&payload.object_key)
        .map_err(|e| FinalizeError::Validation(e.to_string()))?;

    let principal = state.identity().resolve(&req.payload, &req.claims()).await?;
    upload::finalize(&state, &payload.object_key, payload.size, principal.as_ref()).await?;

    Ok(Json(FinalizeResponse {}))
}

#[derive(Debug, thiserror::Error)]
pub enum FinalizeError {
    #[error("invalid request payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl IntoResponse for FinalizeError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "finalize upload rejected");
        match self {
            FinalizeError::Validation(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("invalid request: {}", msg),
            )
                .into_response(),
            FinalizeError::Identity(e) => {
                (http::StatusCode::UNAUTHORIZED, e.to_string()).into_response()
            }
            FinalizeError::Upload(e) => (super::status_for(&e), e.to_string()).into_response(),
        }
    }
}
