//! Error types for parsing and validating foundation types.

use thiserror::Error;

use crate::algorithm::Algorithm;

/// Errors produced while constructing or parsing foundation types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    /// The named hash algorithm is not supported by this build.
    #[error("unsupported hash algorithm: {name}")]
    UnsupportedAlgorithm { name: String },

    /// The named object class is not one of `block`, `tree`, or `stream`.
    #[error("unknown object class: {name}")]
    UnknownClass { name: String },

    /// A digest string contained non-hexadecimal characters.
    #[error("invalid hex in digest: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// A digest had the wrong byte length for its algorithm.
    #[error("invalid digest length for {algorithm}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        algorithm: Algorithm,
        expected: usize,
        actual: usize,
    },

    /// Streams are addressed by label, not by digest.
    #[error("class stream is not content-addressed")]
    StreamNotContentAddressed,
}

/// Errors produced while parsing store addresses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    /// The address does not match the path grammar.
    #[error("malformed path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },

    /// Shard depth outside the supported range.
    #[error("shard depth {depth} exceeds the supported maximum")]
    DepthOutOfRange { depth: usize },

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type TypeResult<T> = std::result::Result<T, TypeError>;
pub type PathResult<T> = std::result::Result<T, PathError>;
