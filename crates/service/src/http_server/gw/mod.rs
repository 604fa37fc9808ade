//! Direct gateway routes: raw object download and direct upload.
//!
//! These bypass the signed-URL flow for deployments where the gateway
//! fronts the store itself. Both routes only accept canonically shaped
//! object keys.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::Router;

use common::content::ContentLocator;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/download/*object_key", get(download_handler))
        .route("/upload/*object_key", put(upload_handler))
        .with_state(state)
}

/// Stream object bytes from the primary store.
pub async fn download_handler(
    State(state): State<ServiceState>,
    Path(object_key): Path<String>,
) -> Result<Response, GatewayError> {
    ContentLocator::parse_object_key(&object_key)
        .map_err(|e| GatewayError::InvalidKey(e.to_string()))?;

    let bytes = state
        .primary()
        .get(&object_key)
        .await
        .map_err(|e| GatewayError::Upstream(e.to_string()))?
        .ok_or(GatewayError::NotFound)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    )
        .into_response())
}

/// Accept a direct upload.
///
/// An existing object is never overwritten: content under a canonical key
/// is immutable once stored, and replacing it would allow substituting
/// corrupt data for already-resolvable content.
pub async fn upload_handler(
    State(state): State<ServiceState>,
    Path(object_key): Path<String>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    ContentLocator::parse_object_key(&object_key)
        .map_err(|e| GatewayError::InvalidKey(e.to_string()))?;

    if body.len() as u64 > state.max_object_size() {
        return Err(GatewayError::TooLarge);
    }

    let existing = state
        .primary()
        .head(&object_key)
        .await
        .map_err(|e| GatewayError::Upstream(e.to_string()))?;
    if existing.is_some() {
        tracing::warn!(key = %object_key, "object already exists, refusing overwrite");
        return Ok((StatusCode::OK, "already exists").into_response());
    }

    state
        .primary()
        .put(&object_key, body)
        .await
        .map_err(|e| GatewayError::Upstream(e.to_string()))?;

    Ok((StatusCode::OK, "").into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("not found")]
    NotFound,
    #[error("object exceeds the maximum permitted size")]
    TooLarge,
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::InvalidKey(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            GatewayError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            GatewayError::TooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()).into_response()
            }
            GatewayError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
        }
    }
}
