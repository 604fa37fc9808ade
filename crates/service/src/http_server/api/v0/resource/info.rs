use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::records::Resource;

use crate::auth::IdentityError;
use crate::http_server::api::v0::Envelope;
use crate::registry::RegistryError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfoPayload {
    pub timestamp: i64,
    pub resource_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfoResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<Envelope>,
) -> Result<impl IntoResponse, ResourceInfoError> {
    let payload: ResourceInfoPayload =
        req.parse_payload().map_err(ResourceInfoError::Validation)?;
    state.identity().resolve(&req.payload, &req.claims()).await?;

    let response = match state.registry().get_resource(&payload.resource_name).await {
        Ok(resource) => ResourceInfoResponse {
            found: true,
            resource: Some(resource),
        },
        Err(RegistryError::NotFound) => ResourceInfoResponse {
            found: false,
            resource: None,
        },
        Err(e) => return Err(ResourceInfoError::Upstream(e.to_string())),
    };

    Ok(Json(response))
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceInfoError {
    #[error("invalid request payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl IntoResponse for ResourceInfoError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "resource info request rejected");
        match self {
            ResourceInfoError::Validation(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("invalid request: {}", msg),
            )
                .into_response(),
            ResourceInfoError::Identity(e) => {
                (http::StatusCode::UNAUTHORIZED, e.to_string()).into_response()
            }
            ResourceInfoError::Upstream(msg) => {
                (http::StatusCode::BAD_GATEWAY, msg).into_response()
            }
        }
    }
}
