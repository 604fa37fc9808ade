//! Stored records the gateway reads or caches.
//!
//! Clients, resources, and the authorization policy are provisioned
//! out-of-band by registration tooling and are strictly read-only here.
//! Resolution records are the gateway's own cached lookup results. All of
//! these serialize with camelCase field names, matching the documents the
//! provisioning tooling writes into the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::crypto::NodeId;

/// Which store a resolution was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreOrigin {
    Primary,
    Fallback,
}

/// A cached, time-bounded content lookup result.
///
/// Created on first successful resolution and evicted purely by TTL or by
/// explicit fallback-mismatch invalidation. Values are immutable
/// snapshots; a record is never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRecord {
    pub object_key: String,
    pub store_origin: StoreOrigin,
    pub size: u64,
    pub signed_url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl ResolutionRecord {
    /// Whether this record has outlived `ttl` as of `now`.
    ///
    /// Expiry is judged at read time against the record's own creation
    /// timestamp, never by background eviction.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age > chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
    }
}

/// A registered automated client.
///
/// Stored at `clients/{client_id}` as JSON. The optional private key
/// material is only present for clients whose keys were escrowed at
/// registration time and must be stripped before a record leaves the
/// registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub client_id: NodeId,
    pub owner_id: String,
    pub label: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_hex: Option<String>,
}

impl Client {
    /// Strip escrowed key material.
    pub fn without_secrets(mut self) -> Self {
        self.private_key_hex = None;
        self
    }
}

/// A registered proxy resource, stored at `resources/{resource_name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub resource_name: String,
    pub owner_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub proxy_url: String,
}

/// The access-control document controlling upload rights.
///
/// Source of truth is a YAML document in the primary store; see the
/// authorization layer for fetch and caching rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationPolicy {
    pub allow_public_upload: bool,
    pub authorized_users: Vec<AuthorizedUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedUser {
    pub user_id: String,
    pub can_upload: bool,
}

impl AuthorizationPolicy {
    /// Whether `user_id` may upload under this policy.
    pub fn allows_upload(&self, user_id: &str) -> bool {
        self.allow_public_upload
            || self
                .authorized_users
                .iter()
                .any(|u| u.user_id == user_id && u.can_upload)
    }
}
