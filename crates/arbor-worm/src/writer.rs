//! Streaming writer for new write-once objects.

use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;
use tracing::debug;

use arbor_hash::HashEngine;
use arbor_types::{Algorithm, Class, Digest, Layout, ObjectPath};

use crate::error::{WormError, WormResult};
use crate::reader::Worm;

/// Hash engine pre-seeded with the class header, as used for object
/// identity. Fails for classes that have no header.
pub fn object_engine(class: Class, algorithm: Algorithm) -> WormResult<HashEngine> {
    let header = class.header().ok_or(WormError::UnsupportedClass { class })?;
    let mut engine = HashEngine::new(algorithm);
    engine.update(header);
    Ok(engine)
}

/// One-shot identity digest of the class header followed by `body`.
pub fn object_digest(class: Class, algorithm: Algorithm, body: &[u8]) -> WormResult<Digest> {
    let mut engine = object_engine(class, algorithm)?;
    engine.update(body);
    Ok(engine.finalize())
}

/// Streaming writer for a single new object.
///
/// Bytes are fed to the content hash and a temp file in the same call.
/// The temp file lives inside the database root so the publishing
/// rename never crosses a filesystem; an abandoned writer removes its
/// temp file on drop and leaves the store untouched.
pub struct WormWriter {
    layout: Layout,
    class: Class,
    engine: HashEngine,
    temp: NamedTempFile,
    written: u64,
}

impl std::fmt::Debug for WormWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WormWriter")
            .field("class", &self.class)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

impl WormWriter {
    /// Open a writer for a new object of `class`. The class header is
    /// written and hashed immediately.
    pub fn create(layout: &Layout, class: Class, algorithm: Algorithm) -> WormResult<Self> {
        let header = class.header().ok_or(WormError::UnsupportedClass { class })?;
        let mut engine = HashEngine::new(algorithm);
        engine.update(header);
        let mut temp = NamedTempFile::new_in(layout.root())?;
        write_fully(&mut temp, header)?;
        Ok(Self {
            layout: layout.clone(),
            class,
            engine,
            temp,
            written: 0,
        })
    }

    /// Append body bytes.
    pub fn write(&mut self, data: &[u8]) -> WormResult<()> {
        self.engine.update(data);
        write_fully(&mut self.temp, data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Body bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Compute the digest, publish the file at its content-derived path
    /// with one atomic rename, and reopen it for reading.
    ///
    /// Publishing over an existing object is harmless: identical
    /// content means identical bytes already on disk.
    pub fn finalize(self) -> WormResult<Worm> {
        let class = self.class;
        let digest = self.engine.finalize();
        let path = ObjectPath::object(class, digest)
            .map_err(|_| WormError::UnsupportedClass { class })?;
        let absolute = self.layout.absolute(&path);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)?;
        }
        self.temp
            .persist(&absolute)
            .map_err(|e| WormError::Io(e.error))?;

        let mut permissions = fs::metadata(&absolute)?.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&absolute, permissions)?;

        debug!(path = %path, size = self.written, "object published");
        Worm::open(&self.layout, &path)
    }
}

// One write call per buffer; a partial write is fatal, not retried.
fn write_fully(file: &mut NamedTempFile, data: &[u8]) -> WormResult<()> {
    let written = file.write(data)?;
    if written < data.len() {
        return Err(WormError::ShortWrite {
            expected: data.len(),
            written,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::*;

    fn test_layout(root: &Path) -> Layout {
        Layout::new(root, 2).unwrap()
    }

    #[test]
    fn published_file_holds_header_then_body() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut writer = WormWriter::create(&layout, Class::Block, Algorithm::Sha256).unwrap();
        writer.write(b"some body").unwrap();
        let worm = writer.finalize().unwrap();

        let raw = fs::read(layout.absolute(worm.path())).unwrap();
        assert_eq!(raw, b"block\nsome body");
    }

    #[test]
    fn digest_covers_header_and_body() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut writer = WormWriter::create(&layout, Class::Block, Algorithm::Sha256).unwrap();
        writer.write(b"payload").unwrap();
        let worm = writer.finalize().unwrap();

        let expected = arbor_hash::hash(Algorithm::Sha256, b"block\npayload");
        assert_eq!(worm.path().digest(), Some(&expected));
    }

    #[test]
    fn block_and_tree_bodies_hash_into_separate_domains() {
        let block = object_digest(Class::Block, Algorithm::Sha256, b"same body").unwrap();
        let tree = object_digest(Class::Tree, Algorithm::Sha256, b"same body").unwrap();
        assert_ne!(block, tree);
    }

    #[test]
    fn stream_class_is_rejected() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let err = WormWriter::create(&layout, Class::Stream, Algorithm::Sha256).unwrap_err();
        assert!(matches!(
            err,
            WormError::UnsupportedClass {
                class: Class::Stream
            }
        ));
        assert!(matches!(
            object_digest(Class::Stream, Algorithm::Sha256, b"x"),
            Err(WormError::UnsupportedClass { .. })
        ));
    }

    #[test]
    fn published_file_is_read_only() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut writer = WormWriter::create(&layout, Class::Tree, Algorithm::Sha256).unwrap();
        writer.write(b"entries").unwrap();
        let worm = writer.finalize().unwrap();

        let metadata = fs::metadata(layout.absolute(worm.path())).unwrap();
        assert!(metadata.permissions().readonly());
    }

    #[test]
    fn republishing_identical_content_is_idempotent() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());

        let mut first = WormWriter::create(&layout, Class::Block, Algorithm::Sha256).unwrap();
        first.write(b"twice stored").unwrap();
        let first = first.finalize().unwrap();

        let mut second = WormWriter::create(&layout, Class::Block, Algorithm::Sha256).unwrap();
        second.write(b"twice stored").unwrap();
        let second = second.finalize().unwrap();

        assert_eq!(first.path(), second.path());
        let raw = fs::read(layout.absolute(first.path())).unwrap();
        assert_eq!(raw, b"block\ntwice stored");
    }

    #[test]
    fn empty_body_is_a_valid_object() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let writer = WormWriter::create(&layout, Class::Block, Algorithm::Sha256).unwrap();
        let worm = writer.finalize().unwrap();

        assert_eq!(worm.size(), 0);
        let raw = fs::read(layout.absolute(worm.path())).unwrap();
        assert_eq!(raw, b"block\n");
    }

    #[test]
    fn writer_tracks_body_bytes() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut writer = WormWriter::create(&layout, Class::Block, Algorithm::Sha512).unwrap();
        assert_eq!(writer.bytes_written(), 0);
        writer.write(b"12345").unwrap();
        writer.write(b"678").unwrap();
        assert_eq!(writer.bytes_written(), 8);
    }

    #[test]
    fn abandoned_writer_leaves_no_object_behind() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut writer = WormWriter::create(&layout, Class::Block, Algorithm::Sha256).unwrap();
        writer.write(b"never finalized").unwrap();
        drop(writer);

        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
