//! Error types for the WORM file protocol.

use thiserror::Error;

use arbor_types::Class;

/// Errors produced while writing or reading write-once object files.
#[derive(Debug, Error)]
pub enum WormError {
    /// The file does not start with the expected class header.
    #[error("malformed header in {path}: expected {expected:?}, found {actual:?}")]
    MalformedHeader {
        path: String,
        expected: String,
        actual: String,
    },

    /// The object is published and sealed; writes are not accepted.
    #[error("object is read-only: {path}")]
    ReadOnly { path: String },

    /// A write call consumed fewer bytes than offered. Treated as
    /// fatal rather than retried.
    #[error("short write: wrote {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// The class is not stored as an object file.
    #[error("class {class} is not stored as an object file")]
    UnsupportedClass { class: Class },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type WormResult<T> = std::result::Result<T, WormError>;
