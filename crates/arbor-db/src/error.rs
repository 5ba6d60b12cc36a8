//! Error types for database lifecycle and operations.

use std::path::PathBuf;

use thiserror::Error;

use arbor_chunk::ChunkError;
use arbor_store::StoreError;
use arbor_stream::StreamError;
use arbor_types::PathError;

/// Errors produced by the database API.
#[derive(Debug, Error)]
pub enum DbError {
    /// Refusing to create a database over existing content.
    #[error("directory is not empty: {dir}")]
    AlreadyExists { dir: PathBuf },

    /// The directory does not hold a readable database configuration.
    #[error("not a database: {dir} ({reason})")]
    NotADatabase { dir: PathBuf, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DbResult<T> = std::result::Result<T, DbError>;
