//! Write-once object files.
//!
//! Every content-addressed object on disk is a WORM file: a class
//! header line followed by the body. [`WormWriter`] streams bytes into
//! a temp file and the content hash at the same time, then publishes
//! the finished file at its digest-derived path with one atomic rename.
//! [`Worm`] opens a published file, verifies the header, and exposes
//! the body through [`std::io::Read`] and [`std::io::Seek`] with
//! body-relative offsets.
//!
//! Once published a file is never modified. Writer and reader are
//! separate types, so there is no handle on which a write-after-publish
//! could even be expressed.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{WormError, WormResult};
pub use reader::Worm;
pub use writer::{object_digest, object_engine, WormWriter};
