//! Foundation types for the Arbor object store.
//!
//! This crate provides the identity and addressing vocabulary used
//! throughout Arbor. Every other Arbor crate depends on `arbor-types`.
//!
//! # Key Types
//!
//! - [`Algorithm`] — Content hash algorithm, part of every address
//! - [`Class`] — Object class (`block`, `tree`, `stream`) and its identity header
//! - [`Digest`] — Hash output paired with the algorithm that produced it
//! - [`ObjectPath`] — Parsed store address
//! - [`Layout`] — Maps addresses to files under a database root

pub mod algorithm;
pub mod class;
pub mod digest;
pub mod error;
pub mod path;

pub use algorithm::Algorithm;
pub use class::Class;
pub use digest::Digest;
pub use error::{PathError, TypeError};
pub use path::{Layout, ObjectPath, DEFAULT_DEPTH, MAX_DEPTH, SHARD_WIDTH};
