//! Top-level database API for the Arbor object store.
//!
//! A database is a directory holding `block/`, `tree/`, and `stream/`
//! namespaces plus a small persisted configuration. [`Database`] ties
//! the lower crates together and is the sole entry point collaborators
//! use: put/get for blocks and trees, chunked ingest, stream linking,
//! removal, verification, and listing.
//!
//! # Example
//!
//! ```no_run
//! use arbor_db::Database;
//! use arbor_types::Algorithm;
//!
//! # fn main() -> Result<(), arbor_db::DbError> {
//! let db = Database::create("/tmp/arbor-example")?;
//! let tree = db.put_stream(Algorithm::Sha256, &b"some data"[..])?;
//! db.link_stream(&tree, "example")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;

pub use config::{DbConfig, CONFIG_FILE};
pub use database::Database;
pub use error::{DbError, DbResult};
