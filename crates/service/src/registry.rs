//! Read-side registry of provisioned clients and resources.
//!
//! Registration happens out-of-band; the gateway only ever reads these
//! records from the primary store, with a short TTL cache in front to
//! absorb repeated lookups from chatty clients.

use std::time::Duration;

use common::crypto::NodeId;
use common::records::{Client, Resource};
use object_store::Storage;

use crate::cache::LocalCache;

/// Failures reading registry records.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("record not found")]
    NotFound,

    #[error("stored record is malformed: {0}")]
    Malformed(String),

    #[error("failed to read registry record: {0}")]
    Fetch(#[from] object_store::StoreError),
}

pub struct Registry {
    storage: Storage,
    clients: LocalCache<Client>,
    resources: LocalCache<Resource>,
}

impl Registry {
    pub fn new(storage: Storage, ttl: Duration, capacity: u64) -> Self {
        Self {
            storage,
            clients: LocalCache::new(capacity, ttl),
            resources: LocalCache::new(capacity, ttl),
        }
    }

    /// Look up a registered client by node id.
    ///
    /// Escrowed key material is stripped before the record is cached or
    /// returned; nothing downstream of the registry ever sees secrets.
    pub async fn get_client(&self, client_id: &NodeId) -> Result<Client, RegistryError> {
        if let Some(client) = self.clients.get(client_id.as_str()) {
            return Ok(client);
        }

        let key = format!("clients/{}", client_id);
        let bytes = self
            .storage
            .get(&key)
            .await?
            .ok_or(RegistryError::NotFound)?;
        let client: Client = serde_json::from_slice(&bytes)
            .map_err(|e| RegistryError::Malformed(e.to_string()))?;
        let client = client.without_secrets();

        self.clients.insert(client_id.as_str(), client.clone());
        Ok(client)
    }

    /// Look up a registered resource by name.
    pub async fn get_resource(&self, resource_name: &str) -> Result<Resource, RegistryError> {
        if let Some(resource) = self.resources.get(resource_name) {
            return Ok(resource);
        }

        let key = format!("resources/{}", resource_name);
        let bytes = self
            .storage
            .get(&key)
            .await?
            .ok_or(RegistryError::NotFound)?;
        let resource: Resource = serde_json::from_slice(&bytes)
            .map_err(|e| RegistryError::Malformed(e.to_string()))?;

        self.resources.insert(resource_name, resource.clone());
        Ok(resource)
    }
}
