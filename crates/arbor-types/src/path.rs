//! Store addresses and the on-disk layout that maps them to files.
//!
//! Addresses come in two shapes. The canonical form is shard-free
//! (`block/sha256/<hex>`, `stream/<label>`) and is the form embedded in
//! tree bodies and printed to users. The on-disk form inserts a fixed
//! number of three-hex-character shard directories after the algorithm
//! segment (`block/sha256/1a2/b3c/<hex>`) so that no single directory
//! collects millions of entries.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::algorithm::Algorithm;
use crate::class::Class;
use crate::digest::Digest;
use crate::error::{PathError, PathResult, TypeError, TypeResult};

/// Hex characters per shard directory level.
pub const SHARD_WIDTH: usize = 3;

/// Default number of shard directory levels.
pub const DEFAULT_DEPTH: usize = 2;

/// Upper bound on configurable shard depth. Keeps `depth * SHARD_WIDTH`
/// comfortably inside the shortest supported digest rendering.
pub const MAX_DEPTH: usize = 8;

/// A parsed store address.
///
/// Blocks and trees are content-addressed by algorithm and digest;
/// streams are addressed by label alone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectPath {
    /// A leaf object holding raw bytes.
    Block(Digest),
    /// An inner node listing child objects.
    Tree(Digest),
    /// A named pointer into the tree namespace.
    Stream(String),
}

impl ObjectPath {
    pub fn block(digest: Digest) -> Self {
        ObjectPath::Block(digest)
    }

    pub fn tree(digest: Digest) -> Self {
        ObjectPath::Tree(digest)
    }

    pub fn stream(label: impl Into<String>) -> Self {
        ObjectPath::Stream(label.into())
    }

    /// Content-addressed path of the given class.
    ///
    /// Fails for [`Class::Stream`], which is addressed by label.
    pub fn object(class: Class, digest: Digest) -> TypeResult<Self> {
        match class {
            Class::Block => Ok(ObjectPath::Block(digest)),
            Class::Tree => Ok(ObjectPath::Tree(digest)),
            Class::Stream => Err(TypeError::StreamNotContentAddressed),
        }
    }

    pub fn class(&self) -> Class {
        match self {
            ObjectPath::Block(_) => Class::Block,
            ObjectPath::Tree(_) => Class::Tree,
            ObjectPath::Stream(_) => Class::Stream,
        }
    }

    pub fn digest(&self) -> Option<&Digest> {
        match self {
            ObjectPath::Block(digest) | ObjectPath::Tree(digest) => Some(digest),
            ObjectPath::Stream(_) => None,
        }
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.digest().map(Digest::algorithm)
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ObjectPath::Stream(label) => Some(label),
            _ => None,
        }
    }

    /// Canonical shard-free rendering. Never varies with shard depth.
    pub fn canonical(&self) -> String {
        match self {
            ObjectPath::Block(digest) | ObjectPath::Tree(digest) => {
                format!("{}/{}/{}", self.class(), digest.algorithm(), digest)
            }
            ObjectPath::Stream(label) => format!("{}/{}", Class::Stream, label),
        }
    }

    /// Relative on-disk form with `depth` shard directories inserted.
    /// Stream addresses are flat and ignore the depth. Depths beyond
    /// [`MAX_DEPTH`] are clamped so the shard slices stay inside the
    /// shortest digest rendering.
    pub fn relative(&self, depth: usize) -> PathBuf {
        let depth = depth.min(MAX_DEPTH);
        match self {
            ObjectPath::Block(digest) | ObjectPath::Tree(digest) => {
                let hex = digest.to_hex();
                let mut path = PathBuf::from(self.class().name());
                path.push(digest.algorithm().name());
                for level in 0..depth {
                    path.push(&hex[level * SHARD_WIDTH..(level + 1) * SHARD_WIDTH]);
                }
                path.push(&hex);
                path
            }
            ObjectPath::Stream(label) => {
                let mut path = PathBuf::from(Class::Stream.name());
                path.push(label);
                path
            }
        }
    }

    /// Parse an address in canonical or shard-qualified form.
    ///
    /// Shard directories, when present, must match the hash prefix they
    /// were derived from; a mismatch means the address was corrupted.
    /// Depths beyond [`MAX_DEPTH`] are clamped, matching [`Self::relative`].
    pub fn parse(address: &str, depth: usize) -> PathResult<Self> {
        let depth = depth.min(MAX_DEPTH);
        let segments: Vec<&str> = address.split('/').collect();
        if segments.len() < 2 {
            return Err(malformed(address, "too few segments"));
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(malformed(address, "empty path segment"));
        }

        let class: Class = segments[0]
            .parse()
            .map_err(|_| malformed(address, format!("unknown class {:?}", segments[0])))?;

        match class {
            Class::Stream => {
                if segments.len() != 2 {
                    return Err(malformed(address, "stream addresses have exactly two segments"));
                }
                Ok(ObjectPath::Stream(segments[1].to_string()))
            }
            Class::Block | Class::Tree => {
                if segments.len() != 3 && segments.len() != 3 + depth {
                    return Err(malformed(
                        address,
                        "expected class/algorithm/hash with optional shard directories",
                    ));
                }
                let algorithm: Algorithm = segments[1].parse()?;
                let last = segments.len() - 1;
                let digest = Digest::from_hex(algorithm, segments[last])?;
                let hex = digest.to_hex();
                for (level, shard) in segments[2..last].iter().enumerate() {
                    let expected = &hex[level * SHARD_WIDTH..(level + 1) * SHARD_WIDTH];
                    if *shard != expected {
                        return Err(malformed(
                            address,
                            format!("shard directory {shard:?} does not match hash prefix"),
                        ));
                    }
                }
                Ok(ObjectPath::object(class, digest)?)
            }
        }
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn malformed(path: &str, reason: impl Into<String>) -> PathError {
    PathError::MalformedPath {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Maps addresses to filesystem locations under a database root.
///
/// Bundles the root directory with the shard depth so the two can never
/// drift apart between call sites.
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
    depth: usize,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, depth: usize) -> PathResult<Self> {
        if depth > MAX_DEPTH {
            return Err(PathError::DepthOutOfRange { depth });
        }
        Ok(Self {
            root: root.into(),
            depth,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// On-disk path of an address, relative to the database root.
    pub fn relative(&self, path: &ObjectPath) -> PathBuf {
        path.relative(self.depth)
    }

    /// Absolute on-disk path of an address.
    pub fn absolute(&self, path: &ObjectPath) -> PathBuf {
        self.root.join(path.relative(self.depth))
    }

    /// Top-level directory holding all objects of a class.
    pub fn class_dir(&self, class: Class) -> PathBuf {
        self.root.join(class.name())
    }

    /// Parse an address against this layout's shard depth.
    pub fn parse(&self, address: &str) -> PathResult<ObjectPath> {
        ObjectPath::parse(address, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_of_repeated(byte: u8) -> Digest {
        Digest::new(Algorithm::Sha256, vec![byte; 32]).unwrap()
    }

    #[test]
    fn canonical_form_is_shard_free() {
        let path = ObjectPath::block(digest_of_repeated(0xab));
        assert_eq!(
            path.canonical(),
            format!("block/sha256/{}", "ab".repeat(32))
        );
    }

    #[test]
    fn relative_form_inserts_shard_directories() {
        let path = ObjectPath::tree(digest_of_repeated(0x12));
        let hex = "12".repeat(32);
        assert_eq!(
            path.relative(2),
            PathBuf::from(format!("tree/sha256/121/212/{hex}"))
        );
        assert_eq!(path.relative(0), PathBuf::from(format!("tree/sha256/{hex}")));
    }

    #[test]
    fn stream_paths_are_flat_at_any_depth() {
        let path = ObjectPath::stream("logs");
        assert_eq!(path.relative(0), PathBuf::from("stream/logs"));
        assert_eq!(path.relative(4), PathBuf::from("stream/logs"));
    }

    #[test]
    fn parse_accepts_canonical_and_sharded_forms() {
        let hex = "ab".repeat(32);
        let canonical = format!("block/sha256/{hex}");
        let sharded = format!("block/sha256/aba/bab/{hex}");

        let from_canonical = ObjectPath::parse(&canonical, 2).unwrap();
        let from_sharded = ObjectPath::parse(&sharded, 2).unwrap();
        assert_eq!(from_canonical, from_sharded);
        assert_eq!(from_canonical.class(), Class::Block);
    }

    #[test]
    fn parse_rejects_mismatched_shard_directories() {
        let hex = "ab".repeat(32);
        let address = format!("block/sha256/xyz/bab/{hex}");
        let err = ObjectPath::parse(&address, 2).unwrap_err();
        assert!(matches!(err, PathError::MalformedPath { .. }));
    }

    #[test]
    fn parse_rejects_short_and_empty_segments() {
        assert!(matches!(
            ObjectPath::parse("block", 2),
            Err(PathError::MalformedPath { .. })
        ));
        assert!(matches!(
            ObjectPath::parse("block//abc", 2),
            Err(PathError::MalformedPath { .. })
        ));
    }

    #[test]
    fn parse_rejects_unknown_class_and_algorithm() {
        let hex = "ab".repeat(32);
        assert!(matches!(
            ObjectPath::parse(&format!("blob/sha256/{hex}"), 2),
            Err(PathError::MalformedPath { .. })
        ));
        assert!(matches!(
            ObjectPath::parse(&format!("block/md5/{hex}"), 2),
            Err(PathError::Type(TypeError::UnsupportedAlgorithm { .. }))
        ));
    }

    #[test]
    fn parse_rejects_wrong_hash_length() {
        let err = ObjectPath::parse("block/sha256/abcd", 2).unwrap_err();
        assert!(matches!(
            err,
            PathError::Type(TypeError::InvalidLength { .. })
        ));
    }

    #[test]
    fn stream_parse_requires_exactly_two_segments() {
        assert_eq!(
            ObjectPath::parse("stream/s1", 2).unwrap(),
            ObjectPath::stream("s1")
        );
        assert!(ObjectPath::parse("stream/a/b", 2).is_err());
    }

    #[test]
    fn oversized_depth_is_clamped() {
        let path = ObjectPath::block(digest_of_repeated(0xab));
        assert_eq!(path.relative(usize::MAX), path.relative(MAX_DEPTH));

        let sharded = path.relative(MAX_DEPTH);
        let address = sharded.to_str().unwrap();
        assert_eq!(ObjectPath::parse(address, usize::MAX).unwrap(), path);
    }

    #[test]
    fn display_matches_canonical() {
        let path = ObjectPath::block(digest_of_repeated(0x01));
        assert_eq!(path.to_string(), path.canonical());
    }

    #[test]
    fn layout_maps_addresses_under_root() {
        let layout = Layout::new("/data/db", 2).unwrap();
        let path = ObjectPath::block(digest_of_repeated(0xcd));
        let hex = "cd".repeat(32);
        assert_eq!(
            layout.absolute(&path),
            PathBuf::from(format!("/data/db/block/sha256/cdc/dcd/{hex}"))
        );
        assert_eq!(layout.class_dir(Class::Stream), PathBuf::from("/data/db/stream"));
    }

    #[test]
    fn layout_rejects_excessive_depth() {
        assert!(matches!(
            Layout::new("/data/db", MAX_DEPTH + 1),
            Err(PathError::DepthOutOfRange { .. })
        ));
    }

    #[test]
    fn layout_parse_honors_configured_depth() {
        let layout = Layout::new("/data/db", 1).unwrap();
        let hex = "ef".repeat(32);
        assert!(layout.parse(&format!("block/sha256/efe/{hex}")).is_ok());
        assert!(layout.parse(&format!("block/sha256/efe/fef/{hex}")).is_err());
    }
}
