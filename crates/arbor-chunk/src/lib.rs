//! Content-defined chunking for the Arbor object store.
//!
//! Large inputs are cut into variable-size chunks at positions chosen by
//! a rolling Rabin fingerprint, so equal content produces equal chunks
//! regardless of where it sits in the stream. The fingerprint is
//! computed modulo an irreducible polynomial over GF(2) that is
//! generated once per database and persisted with it; reusing the same
//! polynomial across ingests is what makes deduplication work.
//!
//! # Key Types
//!
//! - [`Pol`] — A polynomial over GF(2), with irreducibility testing
//! - [`ChunkerConfig`] — Polynomial plus size bounds
//! - [`Chunker`] — Streaming chunker over any [`std::io::Read`]

pub mod chunker;
pub mod error;
pub mod polynomial;

pub use chunker::{
    Chunk, Chunker, ChunkerConfig, DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE, WINDOW_SIZE,
};
pub use error::{ChunkError, ChunkResult};
pub use polynomial::{Pol, CHUNKING_DEGREE};
