//! Node identifiers and request payload signatures.
//!
//! A node identifies itself by the hex encoding of its Ed25519 public key
//! and proves that identity by signing the request payload. Signatures are
//! computed over a deterministic JSON serialization so that any re-encoding
//! of the payload on the way to the gateway cannot invalidate them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};

/// Length of an Ed25519 signature in hex characters.
pub const SIGNATURE_HEX_LEN: usize = 128;

/// Length of a node identifier in hex characters.
const NODE_ID_HEX_LEN: usize = PUBLIC_KEY_SIZE * 2;

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len
        && s.bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A node identifier: the lowercase hex encoding of an Ed25519 public key.
///
/// Validated for length and charset at construction; the implied public
/// key is recovered on demand via [`public_key`](Self::public_key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    pub fn new(hex: impl Into<String>) -> Result<Self, KeyError> {
        let hex = hex.into();
        if !is_lower_hex(&hex, NODE_ID_HEX_LEN) {
            return Err(anyhow::anyhow!(
                "invalid node id: expected {} lowercase hex characters",
                NODE_ID_HEX_LEN
            )
            .into());
        }
        Ok(Self(hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the public key implied by this identifier.
    pub fn public_key(&self) -> Result<PublicKey, KeyError> {
        PublicKey::from_hex(&self.0)
    }

    /// Verify a signature over the canonical serialization of `payload`.
    pub fn verify_payload(&self, payload: &Value, signature: &Signature) -> Result<(), KeyError> {
        let key = self.public_key()?;
        let message = canonical_json(payload);
        key.verify(message.as_bytes(), &signature.to_ed25519()?)
            .map_err(|_| anyhow::anyhow!("signature does not match payload").into())
    }
}

impl From<&PublicKey> for NodeId {
    fn from(key: &PublicKey) -> Self {
        NodeId(key.to_hex())
    }
}

impl TryFrom<String> for NodeId {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A detached Ed25519 signature as a validated lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature(String);

impl Signature {
    pub fn new(hex: impl Into<String>) -> Result<Self, KeyError> {
        let hex = hex.into();
        if !is_lower_hex(&hex, SIGNATURE_HEX_LEN) {
            return Err(anyhow::anyhow!(
                "invalid signature: expected {} lowercase hex characters",
                SIGNATURE_HEX_LEN
            )
            .into());
        }
        Ok(Self(hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn to_ed25519(&self) -> Result<ed25519_dalek::Signature, KeyError> {
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(&self.0, &mut bytes)
            .map_err(|_| anyhow::anyhow!("signature hex decode error"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&bytes))
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(sig: ed25519_dalek::Signature) -> Self {
        Signature(hex::encode(sig.to_bytes()))
    }
}

impl TryFrom<String> for Signature {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.0
    }
}

impl SecretKey {
    /// Sign the canonical serialization of a request payload.
    pub fn sign_payload(&self, payload: &Value) -> Signature {
        self.sign(canonical_json(payload).as_bytes()).into()
    }
}

/// Serialize a JSON value deterministically: object keys sorted at every
/// nesting level, no insignificant whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_keys() {
        let a = json!({"b": 1, "a": {"d": 2, "c": [3, {"f": 4, "e": 5}]}});
        let b = json!({"a": {"c": [3, {"e": 5, "f": 4}], "d": 2}, "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(
            canonical_json(&a),
            r#"{"a":{"c":[3,{"e":5,"f":4}],"d":2},"b":1}"#
        );
    }

    #[test]
    fn test_node_id_round_trip() {
        let key = SecretKey::generate().public();
        let node_id = NodeId::from(&key);
        assert_eq!(node_id.public_key().unwrap().to_bytes(), key.to_bytes());
    }

    #[test]
    fn test_node_id_validation() {
        assert!(NodeId::new("abcd").is_err());
        assert!(NodeId::new("G".repeat(64)).is_err());
        assert!(NodeId::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn test_payload_signature_round_trip() {
        let secret = SecretKey::generate();
        let node_id = NodeId::from(&secret.public());
        let payload = json!({"type": "resolveFile", "hash": "aa", "timestamp": 1});

        let signature = secret.sign_payload(&payload);
        assert!(node_id.verify_payload(&payload, &signature).is_ok());

        // Key order must not matter
        let reordered = json!({"timestamp": 1, "hash": "aa", "type": "resolveFile"});
        assert!(node_id.verify_payload(&reordered, &signature).is_ok());

        // A different payload must not verify
        let tampered = json!({"type": "resolveFile", "hash": "bb", "timestamp": 1});
        assert!(node_id.verify_payload(&tampered, &signature).is_err());

        // A different key must not verify
        let other = NodeId::from(&SecretKey::generate().public());
        assert!(other.verify_payload(&payload, &signature).is_err());
    }
}
