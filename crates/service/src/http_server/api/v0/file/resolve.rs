use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::content::{ContentLocator, HashAlg, Sha1Hash};
use common::records::StoreOrigin;

use crate::auth::IdentityError;
use crate::http_server::api::v0::Envelope;
use crate::locate::Resolution;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvePayload {
    pub timestamp: i64,
    pub hash_alg: HashAlg,
    pub hash: Sha1Hash,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

/// Resolve content by hash.
///
/// Resolution itself is ungated, but any identity material the request
/// does carry must still verify.
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<Envelope>,
) -> Result<impl IntoResponse, ResolveError> {
    let payload: ResolvePayload = req.parse_payload().map_err(ResolveError::Validation)?;
    state.identity().resolve(&req.payload, &req.claims()).await?;

    let content = ContentLocator::new(payload.hash_alg, payload.hash);
    let response = match state.locator().locate(&content, true).await {
        Resolution::Found { record, cache_hit } => ResolveResponse {
            found: true,
            size: Some(record.size),
            object_key: Some(record.object_key),
            url: Some(record.signed_url),
            cache_hit: Some(cache_hit),
            fallback: (record.store_origin == StoreOrigin::Fallback).then_some(true),
        },
        Resolution::NotFound => ResolveResponse {
            found: false,
            ..Default::default()
        },
    };

    Ok(Json(response))
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid request payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "resolve request rejected");
        match self {
            ResolveError::Validation(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("invalid request: {}", msg),
            )
                .into_response(),
            ResolveError::Identity(e) => {
                (http::StatusCode::UNAUTHORIZED, e.to_string()).into_response()
            }
        }
    }
}
