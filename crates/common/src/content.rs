//! Content identity and canonical object key derivation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Length of a sha1 digest in lowercase hex characters.
pub const SHA1_HEX_LEN: usize = 40;

/// Errors constructing content identities.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("malformed {alg} hash: expected {expected} lowercase hex characters")]
    MalformedHash { alg: HashAlg, expected: usize },

    #[error("malformed object key: {0}")]
    MalformedObjectKey(String),
}

/// Hash algorithm identifying a piece of content.
///
/// A closed set: the gateway only ever speaks sha1. Adding an algorithm
/// means a new canonical key prefix and a new hash length, so it must be
/// an explicit variant here rather than a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlg {
    Sha1,
}

impl HashAlg {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlg::Sha1 => "sha1",
        }
    }

    /// Expected hex length of a digest under this algorithm.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlg::Sha1 => SHA1_HEX_LEN,
        }
    }
}

impl fmt::Display for HashAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlg {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(HashAlg::Sha1),
            other => Err(ContentError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// A sha1 content digest as a validated lowercase hex string.
///
/// Construction checks length and charset; once built the value behaves
/// as a plain immutable string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha1Hash(String);

impl Sha1Hash {
    pub fn new(hex: impl Into<String>) -> Result<Self, ContentError> {
        let hex = hex.into();
        let well_formed = hex.len() == SHA1_HEX_LEN
            && hex
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !well_formed {
            return Err(ContentError::MalformedHash {
                alg: HashAlg::Sha1,
                expected: SHA1_HEX_LEN,
            });
        }
        Ok(Self(hex))
    }

    /// Digest arbitrary bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sha1Hash {
    type Error = ContentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sha1Hash> for String {
    fn from(hash: Sha1Hash) -> Self {
        hash.0
    }
}

impl fmt::Display for Sha1Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sha1Hash {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The input identity of a piece of content: algorithm plus digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentLocator {
    pub hash_alg: HashAlg,
    pub hash: Sha1Hash,
}

impl ContentLocator {
    pub fn new(hash_alg: HashAlg, hash: Sha1Hash) -> Self {
        Self { hash_alg, hash }
    }

    /// Derive the canonical object key for this content.
    ///
    /// The digest is sharded into three 2-character path segments followed
    /// by the full digest, prefixed by the algorithm name. Sharding bounds
    /// directory fan-out for store listing operations.
    pub fn object_key(&self) -> String {
        let h = self.hash.as_str();
        format!(
            "{}/{}/{}/{}/{}",
            self.hash_alg,
            &h[0..2],
            &h[2..4],
            &h[4..6],
            h
        )
    }

    /// Parse a canonical object key back into a locator.
    ///
    /// Rejects keys whose shard segments disagree with the digest, so a
    /// round-trip through [`object_key`](Self::object_key) is the only way
    /// to produce an accepted key.
    pub fn parse_object_key(key: &str) -> Result<Self, ContentError> {
        let malformed = || ContentError::MalformedObjectKey(key.to_string());

        let mut parts = key.split('/');
        let alg: HashAlg = parts
            .next()
            .ok_or_else(malformed)?
            .parse()
            .map_err(|_| malformed())?;
        let shards: Vec<&str> = parts.by_ref().take(3).collect();
        let hash = Sha1Hash::new(parts.next().ok_or_else(malformed)?).map_err(|_| malformed())?;
        if parts.next().is_some() || shards.len() != 3 {
            return Err(malformed());
        }

        let h = hash.as_str();
        if shards != [&h[0..2], &h[2..4], &h[4..6]] {
            return Err(malformed());
        }
        Ok(Self::new(alg, hash))
    }
}

/// Cache key for a resolution record.
///
/// A digest of the store uri and object key, so cache entries are scoped
/// to the configured store and never collide across deployments sharing a
/// durable cache.
pub fn resolution_cache_key(store_uri: &str, object_key: &str) -> String {
    Sha1Hash::of_bytes(format!("{}.{}", store_uri, object_key).as_bytes()).into()
}
