//! The database: one configured directory of blocks, trees, and
//! streams.
//!
//! All collaborator-facing operations go through [`Database`] methods.
//! The database itself holds no locks and no caches; safety against
//! concurrent use rests on content-addressed idempotence and atomic
//! renames, exactly as in the underlying crates.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use arbor_chunk::{Chunker, Pol};
use arbor_store::{
    block_size, get_block, put_block, remove_object, verify_block, Block, Tree, TreeEntry,
};
use arbor_stream::Stream;
use arbor_types::{Algorithm, Class, Layout, ObjectPath};

use crate::config::{DbConfig, CONFIG_FILE};
use crate::error::{DbError, DbResult};

/// An open Arbor database.
#[derive(Debug)]
pub struct Database {
    layout: Layout,
    config: DbConfig,
}

impl Database {
    /// Create a new database with the default configuration.
    pub fn create(dir: impl Into<PathBuf>) -> DbResult<Database> {
        Self::create_with(dir, DbConfig::default())
    }

    /// Create a new database at `dir`.
    ///
    /// Fails with [`DbError::AlreadyExists`] when `dir` exists and is
    /// anything but an empty directory. A zero chunker polynomial in
    /// `config` is replaced by a freshly generated irreducible one
    /// before anything is persisted.
    pub fn create_with(dir: impl Into<PathBuf>, mut config: DbConfig) -> DbResult<Database> {
        let dir = dir.into();
        if dir.exists() && (!dir.is_dir() || fs::read_dir(&dir)?.next().is_some()) {
            return Err(DbError::AlreadyExists { dir });
        }

        if config.chunker_polynomial.is_zero() {
            config.chunker_polynomial = Pol::generate(&mut rand::thread_rng());
        }
        config.chunker().validate()?;

        let layout = Layout::new(&dir, config.depth)?;
        fs::create_dir_all(&dir)?;
        for class in [Class::Block, Class::Tree, Class::Stream] {
            fs::create_dir_all(layout.class_dir(class))?;
        }
        fs::write(
            dir.join(CONFIG_FILE),
            serde_json::to_string_pretty(&config)?,
        )?;

        info!(dir = %dir.display(), depth = config.depth, "database created");
        Ok(Database { layout, config })
    }

    /// Open an existing database, loading its persisted configuration.
    pub fn open(dir: impl Into<PathBuf>) -> DbResult<Database> {
        let dir = dir.into();
        let raw = fs::read_to_string(dir.join(CONFIG_FILE))
            .map_err(|e| not_a_database(&dir, format!("cannot read {CONFIG_FILE}: {e}")))?;
        let config: DbConfig = serde_json::from_str(&raw)
            .map_err(|e| not_a_database(&dir, format!("cannot parse {CONFIG_FILE}: {e}")))?;
        config
            .chunker()
            .validate()
            .map_err(|e| not_a_database(&dir, format!("invalid chunker configuration: {e}")))?;
        let layout = Layout::new(&dir, config.depth)
            .map_err(|e| not_a_database(&dir, format!("invalid shard depth: {e}")))?;
        debug!(dir = %dir.display(), depth = config.depth, "database opened");
        Ok(Database { layout, config })
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Parse an address against this database's shard depth.
    pub fn resolve(&self, address: &str) -> DbResult<ObjectPath> {
        Ok(self.layout.parse(address)?)
    }

    /// Store `data` as a block, deduplicating against existing content.
    pub fn put_block(&self, algorithm: Algorithm, data: &[u8]) -> DbResult<Block> {
        Ok(put_block(&self.layout, algorithm, data)?)
    }

    /// Read a block fully into memory.
    pub fn get_block(&self, path: &ObjectPath) -> DbResult<Vec<u8>> {
        Ok(get_block(&self.layout, path)?)
    }

    /// Store a tree over already-persisted children.
    pub fn put_tree(&self, algorithm: Algorithm, entries: Vec<TreeEntry>) -> DbResult<Tree> {
        Ok(Tree::put(&self.layout, algorithm, entries)?)
    }

    /// Load a tree, optionally verifying its body against its path.
    pub fn get_tree(&self, path: &ObjectPath, verify: bool) -> DbResult<Tree> {
        Ok(Tree::get(&self.layout, path, verify)?)
    }

    /// Store `data` as a block and build a new root over the tree at
    /// `path`. Returns the new root; the old tree is unchanged.
    pub fn append_tree(&self, path: &ObjectPath, data: &[u8]) -> DbResult<Tree> {
        let tree = Tree::get(&self.layout, path, false)?;
        let block = put_block(&self.layout, tree.algorithm(), data)?;
        Ok(tree.append(&block)?)
    }

    /// Ingest a byte stream: cut it into content-defined chunks, store
    /// each as a block, and fold the blocks into a tree. The first
    /// chunk seeds a single-entry tree and every later chunk appends,
    /// so the result is the same right-leaning spine appends build.
    ///
    /// Empty input yields a tree over one empty block, so every ingest
    /// returns a readable tree.
    pub fn put_stream<R: Read>(&self, algorithm: Algorithm, reader: R) -> DbResult<Tree> {
        let mut chunker = Chunker::new(reader, self.config.chunker())?;
        let mut root: Option<Tree> = None;
        while let Some(chunk) = chunker.next_chunk()? {
            let block = put_block(&self.layout, algorithm, &chunk.data)?;
            debug!(offset = chunk.offset, len = chunk.len(), "chunk ingested");
            root = Some(match root {
                None => self.single_entry_tree(algorithm, &block)?,
                Some(tree) => tree.append(&block)?,
            });
        }
        match root {
            Some(tree) => Ok(tree),
            None => {
                let block = put_block(&self.layout, algorithm, b"")?;
                self.single_entry_tree(algorithm, &block)
            }
        }
    }

    fn single_entry_tree(&self, algorithm: Algorithm, block: &Block) -> DbResult<Tree> {
        Ok(Tree::put(
            &self.layout,
            algorithm,
            vec![TreeEntry::new(block.path().clone())],
        )?)
    }

    /// Bind `label` to `tree`, replacing any existing binding.
    pub fn link_stream(&self, tree: &Tree, label: &str) -> DbResult<Stream> {
        Ok(Stream::link(&self.layout, tree, label)?)
    }

    /// Open the stream bound to `label`, verifying its root tree.
    pub fn open_stream(&self, label: &str) -> DbResult<Stream> {
        Ok(Stream::open(&self.layout, label)?)
    }

    /// Append `data` to the stream bound to `label` and return the
    /// updated handle.
    pub fn append_stream(&self, label: &str, data: &[u8]) -> DbResult<Stream> {
        let mut stream = Stream::open(&self.layout, label)?;
        stream.append(data)?;
        Ok(stream)
    }

    /// Remove the object or stream link at `path`.
    pub fn rm(&self, path: &ObjectPath) -> DbResult<()> {
        match path {
            ObjectPath::Stream(label) => Ok(Stream::unlink(&self.layout, label)?),
            _ => Ok(remove_object(&self.layout, path)?),
        }
    }

    /// Re-hash the object at `path`, recursively for trees and for the
    /// current root of streams.
    pub fn verify(&self, path: &ObjectPath) -> DbResult<()> {
        match path {
            ObjectPath::Block(_) => Ok(verify_block(&self.layout, path)?),
            ObjectPath::Tree(_) => Ok(Tree::get(&self.layout, path, false)?.verify()?),
            ObjectPath::Stream(label) => Ok(Stream::open(&self.layout, label)?.verify()?),
        }
    }

    /// Body size in bytes of the object at `path`. For trees and
    /// streams this is the total size of the logical byte stream.
    pub fn size(&self, path: &ObjectPath) -> DbResult<u64> {
        match path {
            ObjectPath::Block(_) => Ok(block_size(&self.layout, path)?),
            ObjectPath::Tree(_) => Ok(Tree::get(&self.layout, path, false)?.size()?),
            ObjectPath::Stream(label) => Ok(Stream::open(&self.layout, label)?.size()?),
        }
    }

    /// List the paths reachable from `path`, in stream order.
    pub fn ls(&self, path: &ObjectPath, include_inner: bool) -> DbResult<Vec<ObjectPath>> {
        match path {
            ObjectPath::Block(_) => Ok(vec![path.clone()]),
            ObjectPath::Tree(_) => Ok(Tree::get(&self.layout, path, false)?.ls(include_inner)?),
            ObjectPath::Stream(label) => {
                Ok(Stream::open(&self.layout, label)?.ls(include_inner)?)
            }
        }
    }
}

fn not_a_database(dir: &Path, reason: String) -> DbError {
    DbError::NotADatabase {
        dir: dir.to_path_buf(),
        reason,
    }
}
