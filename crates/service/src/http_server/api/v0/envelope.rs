use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::crypto::{NodeId, Signature};

use crate::auth::IdentityClaims;

/// Common shape of every API request body: an operation payload plus
/// optional identity material.
///
/// The payload is kept as raw JSON here because the node signature is
/// computed over its canonical serialization; each handler parses it into
/// that operation's typed payload exactly once at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub payload: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Envelope {
    pub fn claims(&self) -> IdentityClaims {
        IdentityClaims {
            node_id: self.node_id.clone(),
            signature: self.signature.clone(),
            user_id: self.user_id.clone(),
            access_token: self.access_token.clone(),
        }
    }

    /// Parse the raw payload into this operation's typed payload.
    pub fn parse_payload<P: DeserializeOwned>(&self) -> Result<P, String> {
        serde_json::from_value(self.payload.clone()).map_err(|e| e.to_string())
    }
}
