//! # Principals
//!
//! A principal is the single resolved identity associated with a request.
//!
//! Requests may carry one of two identity kinds:
//! - A **node identity**: a public-key-derived identifier proven by a
//!   signature over the request payload
//! - A **user identity**: an external-provider account confirmed via an
//!   opaque access token
//!
//! Verification happens before a `Principal` is constructed; holding one
//! means the corresponding proof already checked out. A request resolves
//! to at most one principal. Carrying both kinds is an error, enforced by
//! the identity layer rather than this type.

use serde::{Deserialize, Serialize};

use crate::crypto::NodeId;

/// The resolved identity of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Principal {
    /// A registered automated node, authenticated by payload signature.
    Node { node_id: NodeId },
    /// A human user, authenticated by the external identity provider.
    User { user_id: String },
}

impl Principal {
    pub fn node(node_id: NodeId) -> Self {
        Principal::Node { node_id }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Principal::User {
            user_id: user_id.into(),
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::Node { node_id } => write!(f, "node:{}", node_id),
            Principal::User { user_id } => write!(f, "user:{}", user_id),
        }
    }
}
