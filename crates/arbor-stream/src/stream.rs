//! Named stream pointers.
//!
//! A stream is a symlink under `stream/` whose target is the relative
//! path of a tree root. The objects below the root are immutable; the
//! symlink is the only mutable state, and it is only ever replaced by
//! an atomic rename, so a reader resolves either the old root or the
//! new one, never anything in between.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::os::unix::fs::symlink;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use arbor_store::{put_block, Tree};
use arbor_types::{Class, Layout, ObjectPath};

use crate::error::{StreamError, StreamResult};
use crate::label::{validate_label, TMP_SUFFIX};

/// An open stream: a label bound to its current root tree.
///
/// Reads, seeks, and listings all delegate to the root tree. The handle
/// holds the root resolved at open time; concurrent republishes are
/// only observed by re-opening.
pub struct Stream {
    layout: Layout,
    label: String,
    tree: Tree,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("label", &self.label)
            .field("root", &self.tree.path().canonical())
            .finish_non_exhaustive()
    }
}

impl Stream {
    /// Bind `label` to `tree`, replacing any existing binding.
    pub fn link(layout: &Layout, tree: &Tree, label: &str) -> StreamResult<Stream> {
        validate_label(label)?;
        publish_link(layout, tree.path(), label)?;
        let tree = Tree::get(layout, tree.path(), false)?;
        Ok(Stream {
            layout: layout.clone(),
            label: label.to_string(),
            tree,
        })
    }

    /// Resolve `label` and load its root tree with verification.
    pub fn open(layout: &Layout, label: &str) -> StreamResult<Stream> {
        validate_label(label)?;
        let link = layout.absolute(&ObjectPath::stream(label));
        let target = match fs::read_link(&link) {
            Ok(target) => target,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StreamError::NotFound {
                    label: label.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let path = parse_target(layout, label, &target)?;
        let tree = Tree::get(layout, &path, true).map_err(|e| match e {
            arbor_store::StoreError::NotFound { .. } => {
                warn!(label, target = %target.display(), "stream target is dangling");
                broken(label, &target, "does not exist")
            }
            other => other.into(),
        })?;
        Ok(Stream {
            layout: layout.clone(),
            label: label.to_string(),
            tree,
        })
    }

    /// Remove the link for `label`. The trees it pointed at stay on
    /// disk.
    pub fn unlink(layout: &Layout, label: &str) -> StreamResult<()> {
        validate_label(label)?;
        let link = layout.absolute(&ObjectPath::stream(label));
        match fs::remove_file(link) {
            Ok(()) => {
                debug!(label, "stream unlinked");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StreamError::NotFound {
                label: label.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The root tree this handle resolved.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Store `data` as a block, build a new root over the current one,
    /// and republish the link. Previous roots remain reachable by hash.
    pub fn append(&mut self, data: &[u8]) -> StreamResult<()> {
        let block = put_block(&self.layout, self.tree.algorithm(), data)?;
        let root = self.tree.append(&block)?;
        publish_link(&self.layout, root.path(), &self.label)?;
        debug!(label = %self.label, root = %root.path(), "stream republished");
        self.tree = root;
        Ok(())
    }

    /// Total size in bytes of the stream contents.
    pub fn size(&self) -> StreamResult<u64> {
        Ok(self.tree.size()?)
    }

    /// Reset the read cursor to the start of the stream.
    pub fn rewind(&mut self) {
        self.tree.rewind();
    }

    /// List the paths reachable from the current root.
    pub fn ls(&self, include_inner: bool) -> StreamResult<Vec<ObjectPath>> {
        Ok(self.tree.ls(include_inner)?)
    }

    /// Re-hash the current root and everything below it.
    pub fn verify(&self) -> StreamResult<()> {
        Ok(self.tree.verify()?)
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.tree.read(buf)
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.tree.seek(pos)
    }
}

// Write the symlink under a reserved temporary name in the stream
// directory, then rename it over the final name. rename(2) replaces
// the destination atomically, so no reader sees a missing or
// half-written link.
fn publish_link(layout: &Layout, tree: &ObjectPath, label: &str) -> StreamResult<()> {
    let target = link_target(layout, tree);
    let dir = layout.class_dir(Class::Stream);
    fs::create_dir_all(&dir)?;

    let temp = dir.join(format!("{label}{TMP_SUFFIX}"));
    match fs::remove_file(&temp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    symlink(&target, &temp)?;
    fs::rename(&temp, dir.join(label))?;
    debug!(label, target = %target.display(), "stream link published");
    Ok(())
}

// The symlink target, relative to the stream directory the link lives
// in: one step up to the database root, then the tree's on-disk path.
fn link_target(layout: &Layout, tree: &ObjectPath) -> PathBuf {
    Path::new("..").join(layout.relative(tree))
}

// Recover the tree address from a link target by dropping the leading
// parent steps and parsing the rest as a sharded path.
fn parse_target(layout: &Layout, label: &str, target: &Path) -> StreamResult<ObjectPath> {
    let mut segments = Vec::new();
    for component in target.components() {
        match component {
            Component::ParentDir if segments.is_empty() => {}
            Component::Normal(segment) => match segment.to_str() {
                Some(segment) => segments.push(segment),
                None => return Err(broken(label, target, "is not valid utf-8")),
            },
            _ => return Err(broken(label, target, "is not a relative tree path")),
        }
    }
    let address = segments.join("/");
    let path = layout
        .parse(&address)
        .map_err(|e| broken(label, target, format!("is not a store address: {e}")))?;
    if path.class() != Class::Tree {
        return Err(broken(label, target, "does not point into the tree namespace"));
    }
    Ok(path)
}

fn broken(label: &str, target: &Path, reason: impl Into<String>) -> StreamError {
    StreamError::BrokenLink {
        label: label.to_string(),
        target: target.display().to_string(),
        reason: reason.into(),
    }
}
