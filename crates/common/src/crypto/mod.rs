mod keys;
mod signing;

pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use signing::{canonical_json, NodeId, Signature, SIGNATURE_HEX_LEN};
