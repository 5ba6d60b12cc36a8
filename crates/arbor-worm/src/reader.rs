//! Read side of the WORM protocol.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use arbor_types::{Layout, ObjectPath};

use crate::error::{WormError, WormResult};

/// Read handle to a published object.
///
/// The class header is verified on open and then hidden: every offset
/// in the read and seek interface is body-relative.
pub struct Worm {
    file: File,
    path: ObjectPath,
    header_len: u64,
    size: u64,
}

impl std::fmt::Debug for Worm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worm")
            .field("path", &self.path.canonical())
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Worm {
    /// Open a published object and verify its header.
    pub fn open(layout: &Layout, path: &ObjectPath) -> WormResult<Self> {
        let class = path.class();
        let header = class.header().ok_or(WormError::UnsupportedClass { class })?;
        let mut file = File::open(layout.absolute(path))?;

        let mut actual = Vec::with_capacity(header.len());
        file.by_ref()
            .take(header.len() as u64)
            .read_to_end(&mut actual)?;
        if actual != header {
            return Err(WormError::MalformedHeader {
                path: path.canonical(),
                expected: String::from_utf8_lossy(header).into_owned(),
                actual: String::from_utf8_lossy(&actual).into_owned(),
            });
        }

        let header_len = header.len() as u64;
        let size = file.metadata()?.len() - header_len;
        Ok(Self {
            file,
            path: path.clone(),
            header_len,
            size,
        })
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Body size in bytes, header excluded.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current body-relative position.
    pub fn tell(&mut self) -> WormResult<u64> {
        Ok(self.file.stream_position()? - self.header_len)
    }

    /// Always fails: published objects are sealed.
    pub fn write(&mut self, _data: &[u8]) -> WormResult<usize> {
        Err(WormError::ReadOnly {
            path: self.path.canonical(),
        })
    }
}

impl Read for Worm {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for Worm {
    // Start-relative seeks are shifted past the header, end-relative
    // seeks use the body size, and current-relative seeks resolve the
    // underlying position before converting.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => self.header_len as i64 + offset as i64,
            SeekFrom::End(offset) => (self.header_len + self.size) as i64 + offset,
            SeekFrom::Current(offset) => self.file.stream_position()? as i64 + offset,
        };
        if target < self.header_len as i64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of object body",
            ));
        }
        let position = self.file.seek(SeekFrom::Start(target as u64))?;
        Ok(position - self.header_len)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use arbor_types::{Algorithm, Class};

    use super::*;
    use crate::writer::WormWriter;

    fn test_layout(root: &Path) -> Layout {
        Layout::new(root, 2).unwrap()
    }

    fn publish(layout: &Layout, class: Class, body: &[u8]) -> Worm {
        let mut writer = WormWriter::create(layout, class, Algorithm::Sha256).unwrap();
        writer.write(body).unwrap();
        writer.finalize().unwrap()
    }

    fn rewrite(layout: &Layout, path: &ObjectPath, contents: &[u8]) {
        let absolute = layout.absolute(path);
        let mut permissions = fs::metadata(&absolute).unwrap().permissions();
        permissions.set_readonly(false);
        fs::set_permissions(&absolute, permissions).unwrap();
        fs::write(&absolute, contents).unwrap();
    }

    #[test]
    fn read_returns_the_body_without_the_header() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut worm = publish(&layout, Class::Block, b"just the body");

        let mut contents = String::new();
        worm.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "just the body");
        assert_eq!(worm.size(), 13);
    }

    #[test]
    fn seek_offsets_are_body_relative() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut worm = publish(&layout, Class::Block, b"somedata");

        let position = worm.seek(SeekFrom::Start(2)).unwrap();
        assert_eq!(position, 2);
        let mut rest = String::new();
        worm.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "medata");

        let position = worm.seek(SeekFrom::End(-4)).unwrap();
        assert_eq!(position, 4);
        let mut tail = String::new();
        worm.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "data");
    }

    #[test]
    fn current_relative_seek_converts_the_underlying_position() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut worm = publish(&layout, Class::Block, b"abcdefgh");

        worm.seek(SeekFrom::Start(3)).unwrap();
        assert_eq!(worm.seek(SeekFrom::Current(0)).unwrap(), 3);
        assert_eq!(worm.seek(SeekFrom::Current(2)).unwrap(), 5);
        assert_eq!(worm.seek(SeekFrom::Current(-5)).unwrap(), 0);
        assert_eq!(worm.tell().unwrap(), 0);
    }

    #[test]
    fn seeking_before_the_body_fails() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut worm = publish(&layout, Class::Block, b"abc");

        let position = worm.seek(SeekFrom::Start(1)).unwrap();
        assert_eq!(position, 1);
        let err = worm.seek(SeekFrom::Current(-2)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn writes_are_refused() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let mut worm = publish(&layout, Class::Block, b"sealed");

        assert!(matches!(
            worm.write(b"more"),
            Err(WormError::ReadOnly { .. })
        ));
    }

    #[test]
    fn wrong_header_is_rejected_on_open() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let worm = publish(&layout, Class::Block, b"body");
        let path = worm.path().clone();
        drop(worm);

        rewrite(&layout, &path, b"wrong\nbody");
        let err = Worm::open(&layout, &path).unwrap_err();
        assert!(matches!(err, WormError::MalformedHeader { .. }));
    }

    #[test]
    fn truncated_header_is_rejected_on_open() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let worm = publish(&layout, Class::Block, b"body");
        let path = worm.path().clone();
        drop(worm);

        rewrite(&layout, &path, b"bl");
        let err = Worm::open(&layout, &path).unwrap_err();
        match err {
            WormError::MalformedHeader { actual, .. } => assert_eq!(actual, "bl"),
            other => panic!("expected MalformedHeader, got {other:?}"),
        }
    }

    #[test]
    fn missing_object_surfaces_not_found() {
        let dir = tempdir().unwrap();
        let layout = test_layout(dir.path());
        let digest = arbor_hash::hash(Algorithm::Sha256, b"absent");
        let path = ObjectPath::block(digest);

        match Worm::open(&layout, &path).unwrap_err() {
            WormError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected io not-found, got {other:?}"),
        }
    }
}
