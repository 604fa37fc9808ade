/**
 * Content identity: hash algorithms, validated hash
 *  strings, and canonical object key derivation.
 * Pure code, no I/O.
 */
pub mod content;
/**
 * Cryptographic types and operations.
 *  - Public and private key implementations
 *  - Node identifiers and request signatures
 *  - Deterministic payload serialization
 */
pub mod crypto;
/**
 * The resolved identity associated with a request:
 *  either a registered node or an external user.
 */
pub mod principal;
/**
 * Records provisioned out-of-band and read (or cached)
 *  by the gateway: clients, resources, the authorization
 *  policy, and cached resolution results.
 */
pub mod records;

pub mod prelude {
    pub use crate::content::{ContentLocator, HashAlg, Sha1Hash};
    pub use crate::crypto::{NodeId, PublicKey, SecretKey, Signature};
    pub use crate::principal::Principal;
    pub use crate::records::{AuthorizationPolicy, Client, Resource, ResolutionRecord, StoreOrigin};
}
