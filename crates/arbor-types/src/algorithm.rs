//! Supported content hash algorithms.

use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A content hash algorithm.
///
/// The algorithm is part of every address: identical bytes hashed by
/// different algorithms are distinct objects stored at distinct paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// SHA-256, the default for new objects.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl Algorithm {
    /// Every algorithm this build understands.
    pub const ALL: [Algorithm; 2] = [Algorithm::Sha256, Algorithm::Sha512];

    /// Lowercase name, as it appears in addresses and on disk.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Digest length in raw bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Algorithm::Sha256 => 32,
            Algorithm::Sha512 => 64,
        }
    }

    /// Digest length in hex characters.
    pub fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Sha256
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Algorithm::Sha256),
            "sha512" => Ok(Algorithm::Sha512),
            other => Err(TypeError::UnsupportedAlgorithm {
                name: other.to_string(),
            }),
        }
    }
}
