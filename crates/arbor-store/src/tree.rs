//! Merkle trees over stored objects.
//!
//! A tree body is one line per child: the child's canonical path,
//! optionally followed by a space and a label. Because child paths are
//! digests, the tree's own digest commits to its entire subtree; and
//! because the body is hashed in line order, entry order is part of the
//! identity.
//!
//! Trees are immutable. Appending builds a new two-entry root over the
//! old root and the new block, so a growing stream forms a right-leaning
//! spine of small nodes while every previously published root stays
//! valid.

use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, warn};

use arbor_types::{Algorithm, Class, Layout, ObjectPath};
use arbor_worm::{object_digest, Worm, WormWriter};

use crate::block::{body_size, open_worm, verify_object, Block};
use crate::error::{StoreError, StoreResult};

/// One entry in a tree's ordered child list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    path: ObjectPath,
    label: Option<String>,
}

impl TreeEntry {
    pub fn new(path: ObjectPath) -> Self {
        Self { path, label: None }
    }

    pub fn labeled(path: ObjectPath, label: impl Into<String>) -> Self {
        Self {
            path,
            label: Some(label.into()),
        }
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    // Serialized line: canonical path, optionally a space and the
    // label. The label is inside the hashed body on purpose: renaming a
    // child changes the parent's identity.
    fn to_line(&self) -> String {
        match &self.label {
            Some(label) => format!("{} {}", self.path.canonical(), label),
            None => self.path.canonical(),
        }
    }

    fn parse_line(line: &str) -> StoreResult<TreeEntry> {
        let (address, label) = match line.split_once(' ') {
            Some((address, label)) => (address, Some(label.to_string())),
            None => (line, None),
        };
        let path = ObjectPath::parse(address, 0).map_err(|e| StoreError::MalformedEntry {
            reason: format!("{line:?}: {e}"),
        })?;
        let entry = TreeEntry { path, label };
        entry.validate()?;
        Ok(entry)
    }

    fn validate(&self) -> StoreResult<()> {
        if self.path.class() == Class::Stream {
            return Err(stream_in_tree(&self.path));
        }
        if let Some(label) = &self.label {
            if label.is_empty() || label.contains('\n') {
                return Err(StoreError::MalformedEntry {
                    reason: format!("invalid label {label:?}"),
                });
            }
        }
        Ok(())
    }
}

fn stream_in_tree(path: &ObjectPath) -> StoreError {
    StoreError::MalformedEntry {
        reason: format!("{path} cannot be a tree child"),
    }
}

fn serialize_entries(entries: &[TreeEntry]) -> String {
    let mut body = String::new();
    for entry in entries {
        body.push_str(&entry.to_line());
        body.push('\n');
    }
    body
}

fn parse_body(path: &ObjectPath, body: &str) -> StoreResult<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for line in body.lines() {
        entries.push(TreeEntry::parse_line(line)?);
    }
    if entries.is_empty() {
        return Err(StoreError::CorruptObject {
            path: path.canonical(),
            reason: "tree has no entries".to_string(),
        });
    }
    Ok(entries)
}

/// An inner node of the content tree, with a streaming read cursor.
///
/// Entries are references, not loaded children: reading descends into a
/// child only when the cursor reaches it, so opening a deep tree costs
/// one file read regardless of how much data it spans.
pub struct Tree {
    layout: Layout,
    path: ObjectPath,
    algorithm: Algorithm,
    entries: Vec<TreeEntry>,
    cursor: Cursor,
}

// Read position: index of the current entry, plus the open child handle
// once the walk has descended into it.
#[derive(Default)]
struct Cursor {
    index: usize,
    child: Option<Node>,
}

// A child being read through.
enum Node {
    Leaf(Worm),
    Inner(Box<Tree>),
}

impl Node {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Node::Leaf(worm) => worm.read(buf),
            Node::Inner(tree) => tree.read(buf),
        }
    }

    fn tell(&mut self) -> StoreResult<u64> {
        match self {
            Node::Leaf(worm) => Ok(worm.tell()?),
            Node::Inner(tree) => tree.tell(),
        }
    }

    fn seek_to(&mut self, offset: u64) -> StoreResult<()> {
        match self {
            Node::Leaf(worm) => {
                worm.seek(SeekFrom::Start(offset))?;
            }
            Node::Inner(tree) => {
                tree.seek(SeekFrom::Start(offset))?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("path", &self.path.canonical())
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl Tree {
    /// Write a new tree referencing `entries`, or return the existing
    /// identical tree. Entry order is the byte order of the logical
    /// stream and participates in the digest.
    pub fn put(layout: &Layout, algorithm: Algorithm, entries: Vec<TreeEntry>) -> StoreResult<Tree> {
        if entries.is_empty() {
            return Err(StoreError::EmptyTree);
        }
        for entry in &entries {
            entry.validate()?;
        }

        let body = serialize_entries(&entries);
        let digest = object_digest(Class::Tree, algorithm, body.as_bytes())?;
        let path = ObjectPath::tree(digest);
        if layout.absolute(&path).exists() {
            debug!(path = %path, "tree already present, skipping write");
        } else {
            let mut writer = WormWriter::create(layout, Class::Tree, algorithm)?;
            writer.write(body.as_bytes())?;
            writer.finalize()?;
            debug!(path = %path, entries = entries.len(), "tree stored");
        }
        Ok(Tree {
            layout: layout.clone(),
            path,
            algorithm,
            entries,
            cursor: Cursor::default(),
        })
    }

    /// Load a tree object, optionally re-hashing the body against its
    /// path before trusting it.
    pub fn get(layout: &Layout, path: &ObjectPath, verify: bool) -> StoreResult<Tree> {
        let expected = match path {
            ObjectPath::Tree(digest) => digest.clone(),
            other => {
                return Err(StoreError::WrongClass {
                    path: other.canonical(),
                    expected: Class::Tree,
                    found: other.class(),
                })
            }
        };
        let mut worm = open_worm(layout, path)?;
        let mut raw = Vec::with_capacity(worm.size() as usize);
        worm.read_to_end(&mut raw)?;

        if verify {
            let computed = object_digest(Class::Tree, expected.algorithm(), &raw)?;
            if computed != expected {
                warn!(path = %path, "integrity mismatch in tree body");
                return Err(StoreError::IntegrityMismatch {
                    path: path.canonical(),
                    expected: expected.to_hex(),
                    computed: computed.to_hex(),
                });
            }
        }

        let body = String::from_utf8(raw).map_err(|_| StoreError::CorruptObject {
            path: path.canonical(),
            reason: "tree body is not utf-8".to_string(),
        })?;
        let entries = parse_body(path, &body)?;
        Ok(Tree {
            layout: layout.clone(),
            path: path.clone(),
            algorithm: expected.algorithm(),
            entries,
            cursor: Cursor::default(),
        })
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Store a new root `[self, block]`. The receiver is unchanged;
    /// every previously published root stays resolvable.
    pub fn append(&self, block: &Block) -> StoreResult<Tree> {
        Tree::put(
            &self.layout,
            self.algorithm,
            vec![
                TreeEntry::new(self.path.clone()),
                TreeEntry::new(block.path().clone()),
            ],
        )
    }

    /// Total size in bytes of the logical stream this tree spans.
    /// Computed from file metadata on every call, never cached.
    pub fn size(&self) -> StoreResult<u64> {
        let mut total = 0;
        for index in 0..self.entries.len() {
            total += self.child_size(index)?;
        }
        Ok(total)
    }

    /// Depth-first listing of every path reachable from this tree.
    /// Leaves appear in stream order; `include_inner` adds each tree
    /// ahead of its children.
    pub fn ls(&self, include_inner: bool) -> StoreResult<Vec<ObjectPath>> {
        let mut listing = Vec::new();
        self.walk(include_inner, &mut listing)?;
        Ok(listing)
    }

    fn walk(&self, include_inner: bool, listing: &mut Vec<ObjectPath>) -> StoreResult<()> {
        if include_inner {
            listing.push(self.path.clone());
        }
        for entry in &self.entries {
            match entry.path().class() {
                Class::Block => listing.push(entry.path().clone()),
                Class::Tree => {
                    let subtree = Tree::get(&self.layout, entry.path(), false)?;
                    subtree.walk(include_inner, listing)?;
                }
                Class::Stream => return Err(stream_in_tree(entry.path())),
            }
        }
        Ok(())
    }

    /// Re-hash this tree and every reachable descendant against the
    /// paths they live at. The first mismatch stops the walk and is
    /// reported as an error naming the offending path.
    pub fn verify(&self) -> StoreResult<()> {
        verify_subtree(&self.layout, &self.path)
    }

    /// Reset the read cursor to the start of the stream.
    pub fn rewind(&mut self) {
        self.cursor = Cursor::default();
    }

    /// Current body-relative position, derived from the cursor state
    /// rather than tracked separately.
    pub fn tell(&mut self) -> StoreResult<u64> {
        let mut position = 0;
        for index in 0..self.cursor.index {
            position += self.child_size(index)?;
        }
        if let Some(child) = self.cursor.child.as_mut() {
            position += child.tell()?;
        }
        Ok(position)
    }

    fn child_size(&self, index: usize) -> StoreResult<u64> {
        let entry = &self.entries[index];
        match entry.path().class() {
            Class::Block => body_size(&self.layout, entry.path()),
            Class::Tree => Tree::get(&self.layout, entry.path(), false)?.size(),
            Class::Stream => Err(stream_in_tree(entry.path())),
        }
    }

    fn load_child(&self, index: usize) -> StoreResult<Node> {
        let entry = &self.entries[index];
        match entry.path().class() {
            Class::Block => Ok(Node::Leaf(open_worm(&self.layout, entry.path())?)),
            Class::Tree => Ok(Node::Inner(Box::new(Tree::get(
                &self.layout,
                entry.path(),
                false,
            )?))),
            Class::Stream => Err(stream_in_tree(entry.path())),
        }
    }
}

fn verify_subtree(layout: &Layout, path: &ObjectPath) -> StoreResult<()> {
    let tree = Tree::get(layout, path, true)?;
    for entry in tree.entries() {
        match entry.path().class() {
            Class::Block => verify_object(layout, entry.path())?,
            Class::Tree => verify_subtree(layout, entry.path())?,
            Class::Stream => return Err(stream_in_tree(entry.path())),
        }
    }
    Ok(())
}

impl Read for Tree {
    // Concatenates leaf bodies in entry order. A child is opened when
    // the cursor reaches it and dropped once exhausted; the next child
    // starts reading at its own offset zero.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.cursor.index >= self.entries.len() {
                return Ok(0);
            }
            let mut child = match self.cursor.child.take() {
                Some(child) => child,
                None => self
                    .load_child(self.cursor.index)
                    .map_err(io::Error::other)?,
            };
            match child.read(buf) {
                Ok(0) => {
                    self.cursor.index += 1;
                }
                Ok(n) => {
                    self.cursor.child = Some(child);
                    return Ok(n);
                }
                Err(e) => {
                    self.cursor.child = Some(child);
                    return Err(e);
                }
            }
        }
    }
}

impl Seek for Tree {
    // Walks the entry list accumulating child sizes until the target
    // offset falls inside one, then positions that child. Seeking to
    // exactly the total size parks the cursor at end of stream.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => self.size().map_err(io::Error::other)? as i64 + offset,
            SeekFrom::Current(offset) => self.tell().map_err(io::Error::other)? as i64 + offset,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of stream",
            ));
        }

        let mut remaining = target as u64;
        self.cursor = Cursor::default();
        for index in 0..self.entries.len() {
            let size = self.child_size(index).map_err(io::Error::other)?;
            if remaining < size {
                let mut child = self.load_child(index).map_err(io::Error::other)?;
                child.seek_to(remaining).map_err(io::Error::other)?;
                self.cursor.index = index;
                self.cursor.child = Some(child);
                return Ok(target as u64);
            }
            remaining -= size;
        }
        if remaining > 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek beyond end of stream",
            ));
        }
        self.cursor.index = self.entries.len();
        Ok(target as u64)
    }
}
