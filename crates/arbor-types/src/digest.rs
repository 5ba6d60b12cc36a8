//! Content digests.

use std::fmt;

use crate::algorithm::Algorithm;
use crate::error::{TypeError, TypeResult};

/// A hash output paired with the algorithm that produced it.
///
/// The pairing is load-bearing: a digest is only meaningful relative to
/// its algorithm, and addresses embed both.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: Algorithm,
    bytes: Vec<u8>,
}

impl Digest {
    /// Wrap raw digest bytes, checking the length against the algorithm.
    pub fn new(algorithm: Algorithm, bytes: Vec<u8>) -> TypeResult<Self> {
        if bytes.len() != algorithm.digest_len() {
            return Err(TypeError::InvalidLength {
                algorithm,
                expected: algorithm.digest_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self { algorithm, bytes })
    }

    /// Parse a digest from its hex form.
    pub fn from_hex(algorithm: Algorithm, hex_str: &str) -> TypeResult<Self> {
        let bytes = hex::decode(hex_str)?;
        Self::new(algorithm, bytes)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex rendering, as used in addresses.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// First eight hex characters, for log lines.
    pub fn short_hex(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.short_hex())
    }
}
