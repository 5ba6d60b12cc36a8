//! Content hashing for the Arbor object store.
//!
//! A thin seam over the `sha2` hashers: one streaming engine selected by
//! [`arbor_types::Algorithm`] at runtime, plus a one-shot helper. Object
//! identity (class header followed by body) is assembled a level up, in
//! `arbor-worm`, by feeding both through an engine.

pub mod engine;

pub use engine::{hash, HashEngine};
