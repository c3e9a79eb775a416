use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Short human prefix stamped on every fingerprint this node mints.
///
/// Bit-exactness across providers is not required: the chain stores whatever
/// fingerprint the uploader submitted, so the prefix is purely a local
/// namespacing convenience.
pub const FID_PREFIX: &str = "spn1";

/// File fingerprint: hex SHA-256 of the complete original byte stream,
/// prefixed with [`FID_PREFIX`]. Uniquely identifies stored bytes on this
/// node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fid(String);

impl Fid {
    /// Computes the fingerprint for a complete byte stream.
    pub fn from_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Fid(format!("{FID_PREFIX}{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an already-computed fingerprint string, e.g. one read back from
    /// disk or the contract index. Does not validate the prefix: fingerprints
    /// minted by other nodes may use a different one.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Fid(raw.into())
    }
}

impl fmt::Display for Fid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque contract identifier minted by the chain. Many [`Cid`]s may bind to
/// one [`Fid`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cid(String);

impl Cid {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Cid(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = Fid::from_bytes(b"hello world");
        let b = Fid::from_bytes(b"hello world");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with(FID_PREFIX));
    }

    #[test]
    fn fingerprint_differs_on_content() {
        let a = Fid::from_bytes(b"hello world");
        let b = Fid::from_bytes(b"hello worlds");
        assert_ne!(a, b);
    }
}
