//! Named mutable pointers over immutable trees.
//!
//! Everything content-addressed in Arbor is immutable; streams are the
//! one mutable thing. A stream is a validated label bound to a tree
//! root through a symlink, replaced atomically on every append so
//! readers always resolve a complete root. Old roots stay on disk,
//! still reachable by hash.

pub mod error;
pub mod label;
pub mod stream;

pub use error::{StreamError, StreamResult};
pub use label::{validate_label, MAX_LABEL_LEN};
pub use stream::Stream;
