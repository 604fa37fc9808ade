//! Shared test utilities for gateway integration tests
#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;

use common::content::{ContentLocator, HashAlg, Sha1Hash};
use common::crypto::{NodeId, SecretKey};
use common::records::Client;
use hashgate_service::auth::{StaticTokenVerifier, POLICY_OBJECT_KEY};
use hashgate_service::config::{CacheConfig, DEFAULT_MAX_OBJECT_SIZE};
use hashgate_service::ServiceState;
use object_store::{KvDatabase, StaticSigner, Storage};

pub const OPEN_POLICY: &str = "allowPublicUpload: true\nauthorizedUsers: []\n";

pub const RESTRICTED_POLICY: &str = "allowPublicUpload: false\nauthorizedUsers:\n  - userId: alice\n    canUpload: true\n  - userId: bob\n    canUpload: false\n";

pub struct TestEnv {
    pub state: ServiceState,
    pub primary: Storage,
    pub fallback: Storage,
    pub kv: KvDatabase,
    pub provider: Arc<StaticTokenVerifier>,
}

/// Set up a gateway over memory storage, an in-memory durable cache, a
/// static signer, and a fixed token table ("tok-alice" -> "alice",
/// "tok-bob" -> "bob").
pub async fn setup() -> TestEnv {
    let primary = Storage::memory();
    let fallback = Storage::memory();
    let kv = KvDatabase::in_memory().await.unwrap();
    let signer = Arc::new(StaticSigner::new("http://signed.test/").unwrap());
    let provider = Arc::new(StaticTokenVerifier::new([
        ("tok-alice".to_string(), "alice".to_string()),
        ("tok-bob".to_string(), "bob".to_string()),
    ]));

    let state = ServiceState::new(
        primary.clone(),
        Some(fallback.clone()),
        signer,
        kv.clone(),
        provider.clone(),
        CacheConfig::default(),
        DEFAULT_MAX_OBJECT_SIZE,
    );

    TestEnv {
        state,
        primary,
        fallback,
        kv,
        provider,
    }
}

pub async fn write_policy(storage: &Storage, yaml: &str) {
    storage
        .put(POLICY_OBJECT_KEY, Bytes::from(yaml.to_string()))
        .await
        .unwrap();
}

pub fn content_for(data: &[u8]) -> ContentLocator {
    ContentLocator::new(HashAlg::Sha1, Sha1Hash::of_bytes(data))
}

/// Store `data` under its canonical key and return its locator.
pub async fn store_content(storage: &Storage, data: &[u8]) -> ContentLocator {
    let locator = content_for(data);
    storage
        .put(&locator.object_key(), Bytes::from(data.to_vec()))
        .await
        .unwrap();
    locator
}

/// Provision a client record owned by `owner` for the given key.
pub async fn register_client(storage: &Storage, secret: &SecretKey, owner: &str) -> NodeId {
    let node_id = NodeId::from(&secret.public());
    let client = Client {
        client_id: node_id.clone(),
        owner_id: owner.into(),
        label: "test client".into(),
        created_at: Utc::now(),
        private_key_hex: None,
    };
    storage
        .put(
            &format!("clients/{}", node_id),
            Bytes::from(serde_json::to_vec(&client).unwrap()),
        )
        .await
        .unwrap();
    node_id
}
