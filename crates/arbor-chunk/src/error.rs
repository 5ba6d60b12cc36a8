//! Error types for chunking.

use thiserror::Error;

/// Errors produced while configuring or running a chunker.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The polynomial cannot drive the rolling fingerprint.
    #[error("invalid chunker polynomial: {reason}")]
    InvalidPolynomial { reason: String },

    /// The size bounds do not describe a usable chunk range.
    #[error("invalid chunk bounds (min {min}, max {max}): {reason}")]
    InvalidBounds {
        min: usize,
        max: usize,
        reason: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChunkResult<T> = std::result::Result<T, ChunkError>;
