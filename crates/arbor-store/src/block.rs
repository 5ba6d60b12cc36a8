//! Leaf objects: immutable byte blocks.

use std::fs;
use std::io::{self, Read};

use tracing::{debug, warn};

use arbor_types::{Algorithm, Class, Layout, ObjectPath};
use arbor_worm::{object_digest, object_engine, Worm, WormError, WormWriter};

use crate::error::{StoreError, StoreResult};

/// Handle to a stored leaf object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    path: ObjectPath,
}

impl Block {
    pub(crate) fn from_path(path: ObjectPath) -> Self {
        Block { path }
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Open the underlying object for streaming reads.
    pub fn open(&self, layout: &Layout) -> StoreResult<Worm> {
        open_worm(layout, &self.path)
    }

    /// Body size in bytes.
    pub fn size(&self, layout: &Layout) -> StoreResult<u64> {
        body_size(layout, &self.path)
    }
}

/// Store `data` as a block, or return the existing block if identical
/// content is already present. Existing content is never rewritten.
pub fn put_block(layout: &Layout, algorithm: Algorithm, data: &[u8]) -> StoreResult<Block> {
    let digest = object_digest(Class::Block, algorithm, data)?;
    let path = ObjectPath::block(digest);
    if layout.absolute(&path).exists() {
        debug!(path = %path, "block already present, skipping write");
        return Ok(Block::from_path(path));
    }

    let mut writer = WormWriter::create(layout, Class::Block, algorithm)?;
    writer.write(data)?;
    writer.finalize()?;
    debug!(path = %path, size = data.len(), "block stored");
    Ok(Block::from_path(path))
}

/// Read a block fully into memory.
pub fn get_block(layout: &Layout, path: &ObjectPath) -> StoreResult<Vec<u8>> {
    expect_class(path, Class::Block)?;
    let mut worm = open_worm(layout, path)?;
    let mut data = Vec::with_capacity(worm.size() as usize);
    worm.read_to_end(&mut data)?;
    Ok(data)
}

/// Body size in bytes of the block at `path`.
pub fn block_size(layout: &Layout, path: &ObjectPath) -> StoreResult<u64> {
    expect_class(path, Class::Block)?;
    body_size(layout, path)
}

/// Re-hash a block's stored bytes and compare with its path.
pub fn verify_block(layout: &Layout, path: &ObjectPath) -> StoreResult<()> {
    expect_class(path, Class::Block)?;
    verify_object(layout, path)
}

/// Remove a stored object's file or stream link.
pub fn remove_object(layout: &Layout, path: &ObjectPath) -> StoreResult<()> {
    match fs::remove_file(layout.absolute(path)) {
        Ok(()) => {
            debug!(path = %path, "object removed");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
            path: path.canonical(),
        }),
        Err(e) => Err(e.into()),
    }
}

// Re-hash header plus body through a streaming engine and compare with
// the digest the path claims.
pub(crate) fn verify_object(layout: &Layout, path: &ObjectPath) -> StoreResult<()> {
    let expected = match path {
        ObjectPath::Block(digest) | ObjectPath::Tree(digest) => digest.clone(),
        ObjectPath::Stream(_) => {
            return Err(WormError::UnsupportedClass {
                class: Class::Stream,
            }
            .into())
        }
    };
    let mut worm = open_worm(layout, path)?;
    let mut engine = object_engine(path.class(), expected.algorithm())?;
    io::copy(&mut worm, &mut engine)?;
    let computed = engine.finalize();
    if computed != expected {
        warn!(path = %path, "integrity mismatch");
        return Err(StoreError::IntegrityMismatch {
            path: path.canonical(),
            expected: expected.to_hex(),
            computed: computed.to_hex(),
        });
    }
    Ok(())
}

// Open a worm, translating a missing file into NotFound.
pub(crate) fn open_worm(layout: &Layout, path: &ObjectPath) -> StoreResult<Worm> {
    Worm::open(layout, path).map_err(|e| match e {
        WormError::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            StoreError::NotFound {
                path: path.canonical(),
            }
        }
        other => other.into(),
    })
}

// Body size from file metadata, header excluded.
pub(crate) fn body_size(layout: &Layout, path: &ObjectPath) -> StoreResult<u64> {
    let class = path.class();
    let header = class.header().ok_or(WormError::UnsupportedClass { class })?;
    let metadata = match fs::metadata(layout.absolute(path)) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound {
                path: path.canonical(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    metadata
        .len()
        .checked_sub(header.len() as u64)
        .ok_or_else(|| StoreError::CorruptObject {
            path: path.canonical(),
            reason: "file is shorter than its class header".to_string(),
        })
}

pub(crate) fn expect_class(path: &ObjectPath, expected: Class) -> StoreResult<()> {
    if path.class() != expected {
        return Err(StoreError::WrongClass {
            path: path.canonical(),
            expected,
            found: path.class(),
        });
    }
    Ok(())
}
