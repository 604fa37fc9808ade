use axum::routing::post;
use axum::Router;
use http::StatusCode;

pub mod finalize;
pub mod initiate;

use crate::upload::UploadError;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/initiate", post(initiate::handler))
        .route("/finalize", post(finalize::handler))
        .with_state(state)
}

/// Status code mapping shared by the upload handlers.
pub(crate) fn status_for(error: &UploadError) -> StatusCode {
    match error {
        UploadError::SizeLimit { .. } => StatusCode::BAD_REQUEST,
        UploadError::SizeMismatch { .. } => StatusCode::CONFLICT,
        UploadError::MissingObject => StatusCode::NOT_FOUND,
        UploadError::Identity(_) => StatusCode::UNAUTHORIZED,
        UploadError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        UploadError::PolicyUnavailable(_) | UploadError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}
