//! Persisted database configuration.
//!
//! The configuration is written once at creation and loaded verbatim on
//! every open. Nothing in it may be re-derived later: the shard depth
//! decides where every object lives, and the chunker parameters decide
//! where chunk boundaries fall, so changing either would orphan all
//! existing content.

use serde::{Deserialize, Serialize};

use arbor_chunk::{ChunkerConfig, Pol, DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE};
use arbor_types::DEFAULT_DEPTH;

/// Name of the configuration file under the database root.
pub const CONFIG_FILE: &str = "config.json";

/// Configuration for one database directory.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DbConfig {
    /// Number of shard directory levels under each class directory.
    pub depth: usize,
    /// Irreducible polynomial driving chunk boundaries. Zero in a
    /// not-yet-persisted config means "generate one at creation".
    pub chunker_polynomial: Pol,
    /// No chunk boundary is cut before this many bytes.
    pub min_chunk_size: usize,
    /// A chunk boundary is forced at this many bytes.
    pub max_chunk_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            chunker_polynomial: Pol::from_raw(0),
            min_chunk_size: DEFAULT_MIN_SIZE,
            max_chunk_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl DbConfig {
    /// The chunker parameters this configuration prescribes.
    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig::with_bounds(
            self.chunker_polynomial,
            self.min_chunk_size,
            self.max_chunk_size,
        )
    }
}
