use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::content::{ContentLocator, HashAlg, Sha1Hash};

use crate::auth::IdentityError;
use crate::http_server::api::v0::Envelope;
use crate::upload::{self, InitiateOutcome, UploadError};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePayload {
    pub timestamp: i64,
    pub size: u64,
    pub hash_alg: HashAlg,
    pub hash: Sha1Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub already_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_upload_url: Option<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<Envelope>,
) -> Result<impl IntoResponse, InitiateError> {
    let payload: InitiatePayload = req.parse_payload().map_err(InitiateError::Validation)?;
    let principal = state.identity().resolve(&req.payload, &req.claims()).await?;

    let content = ContentLocator::new(payload.hash_alg, payload.hash);
    let outcome = upload::initiate(&state, payload.size, &content, principal.as_ref()).await?;

    let response = match outcome {
        InitiateOutcome::AlreadyExists => InitiateResponse {
            already_exists: true,
            object_key: None,
            signed_upload_url: None,
        },
        InitiateOutcome::Pending {
            object_key,
            signed_upload_url,
        } => InitiateResponse {
            already_exists: false,
            object_key: Some(object_key),
            signed_upload_url: Some(signed_upload_url.to_string()),
        },
    };

    Ok(Json(response))
}

#[derive(Debug, thiserror::Error)]
pub enum InitiateError {
    #[error("invalid request payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl IntoResponse for InitiateError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "initiate upload rejected");
        match self {
            InitiateError::Validation(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("invalid request: {}", msg),
            )
                .into_response(),
            InitiateError::Identity(e) => {
                (http::StatusCode::UNAUTHORIZED, e.to_string()).into_response()
            }
            InitiateError::Upload(e) => (super::status_for(&e), e.to_string()).into_response(),
        }
    }
}
