//! Error types for the object store.

use thiserror::Error;

use arbor_types::{Class, PathError};
use arbor_worm::WormError;

/// Errors produced by block and tree operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object exists at the given path.
    #[error("object not found: {path}")]
    NotFound { path: String },

    /// The path's class does not match the operation.
    #[error("wrong class for {path}: expected {expected}, found {found}")]
    WrongClass {
        path: String,
        expected: Class,
        found: Class,
    },

    /// Stored bytes no longer hash to the path they live at.
    #[error("integrity mismatch in {path}: expected {expected}, computed {computed}")]
    IntegrityMismatch {
        path: String,
        expected: String,
        computed: String,
    },

    /// The object's on-disk representation violates its format.
    #[error("corrupt object {path}: {reason}")]
    CorruptObject { path: String, reason: String },

    /// Trees must reference at least one child.
    #[error("refusing to store a tree with no entries")]
    EmptyTree,

    /// A tree entry is not representable.
    #[error("malformed tree entry: {reason}")]
    MalformedEntry { reason: String },

    #[error(transparent)]
    Worm(#[from] WormError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
