//! Block and tree storage.
//!
//! Blocks are the deduplication atoms: raw bytes published once at
//! their content-derived path and never rewritten. Trees are Merkle
//! inner nodes over blocks and other trees, readable and seekable as a
//! single logical byte stream without materializing the whole tree.
//!
//! Both are stored through the WORM protocol, so every object carries
//! its class header and can be re-verified against its path at any
//! time.

pub mod block;
pub mod error;
pub mod tree;

pub use block::{block_size, get_block, put_block, remove_object, verify_block, Block};
pub use error::{StoreError, StoreResult};
pub use tree::{Tree, TreeEntry};
