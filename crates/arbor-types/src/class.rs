//! Object classes: the namespaces of the store.

use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// The class of a stored object.
///
/// Classes partition the store into separate top-level directories and,
/// through the class header, into separate identity domains: a block and
/// a tree with byte-identical bodies hash to different digests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Class {
    /// An immutable leaf holding raw bytes.
    Block,
    /// An inner node listing child objects in order.
    Tree,
    /// A named mutable pointer to a tree root.
    Stream,
}

impl Class {
    pub const ALL: [Class; 3] = [Class::Block, Class::Tree, Class::Stream];

    /// Lowercase name, also the top-level directory for this class.
    pub fn name(&self) -> &'static str {
        match self {
            Class::Block => "block",
            Class::Tree => "tree",
            Class::Stream => "stream",
        }
    }

    /// Header line written at the start of every stored object of this
    /// class. The header is fed to the hash ahead of the body, so it
    /// participates in the object's identity. Streams are symlinks on
    /// disk and carry no header.
    pub fn header(&self) -> Option<&'static [u8]> {
        match self {
            Class::Block => Some(b"block\n"),
            Class::Tree => Some(b"tree\n"),
            Class::Stream => None,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Class {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Class::Block),
            "tree" => Ok(Class::Tree),
            "stream" => Ok(Class::Stream),
            other => Err(TypeError::UnknownClass {
                name: other.to_string(),
            }),
        }
    }
}
