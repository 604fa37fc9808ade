//! Storage backends for the hashgate gateway.
//!
//! Three concerns live here, each behind a small seam the service core
//! consumes as an abstract capability:
//! - [`Storage`]: object storage (memory / local filesystem / S3) with
//!   head/get/put/delete semantics
//! - [`KvDatabase`]: a durable key-value cache tier backed by SQLite
//! - [`UrlSigner`]: temporary signed GET/PUT URL issuance

mod database;
mod error;
mod signer;
mod storage;

pub use database::KvDatabase;
pub use error::{Result, StoreError};
pub use signer::{PresignerClient, SignedUrlOperation, SignerConfig, StaticSigner, UrlSigner};
pub use storage::{ObjectHead, Storage, StorageConfig};
