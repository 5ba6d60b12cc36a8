//! Error types for stream operations.

use thiserror::Error;

use arbor_store::StoreError;
use arbor_types::PathError;

/// Errors produced by stream link, open, and append operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The label cannot be used as a stream name.
    #[error("invalid stream label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: String },

    /// No stream link exists under the given label.
    #[error("stream not found: {label}")]
    NotFound { label: String },

    /// The link exists but its target is not a loadable tree.
    #[error("stream {label} is broken: target {target:?} {reason}")]
    BrokenLink {
        label: String,
        target: String,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StreamResult<T> = std::result::Result<T, StreamError>;
