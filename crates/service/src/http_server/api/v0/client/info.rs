use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::crypto::NodeId;
use common::records::Client;

use crate::auth::IdentityError;
use crate::http_server::api::v0::Envelope;
use crate::registry::RegistryError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfoPayload {
    pub timestamp: i64,
    pub client_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfoResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
}

/// Look up a registered client. Secrets never leave the registry, so the
/// returned record is safe to hand to any caller.
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<Envelope>,
) -> Result<impl IntoResponse, ClientInfoError> {
    let payload: ClientInfoPayload = req.parse_payload().map_err(ClientInfoError::Validation)?;
    state.identity().resolve(&req.payload, &req.claims()).await?;

    let response = match state.registry().get_client(&payload.client_id).await {
        Ok(client) => ClientInfoResponse {
            found: true,
            client: Some(client),
        },
        Err(RegistryError::NotFound) => ClientInfoResponse {
            found: false,
            client: None,
        },
        Err(e) => return Err(ClientInfoError::Upstream(e.to_string())),
    };

    Ok(Json(response))
}

#[derive(Debug, thiserror::Error)]
pub enum ClientInfoError {
    #[error("invalid request payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl IntoResponse for ClientInfoError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "client info request rejected");
        match self {
            ClientInfoError::Validation(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("invalid request: {}", msg),
            )
                .into_response(),
            ClientInfoError::Identity(e) => {
                (http::StatusCode::UNAUTHORIZED, e.to_string()).into_response()
            }
            ClientInfoError::Upstream(msg) => {
                (http::StatusCode::BAD_GATEWAY, msg).into_response()
            }
        }
    }
}
