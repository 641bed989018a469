//! Core types shared across the tree engine.

use std::fmt;

/// Numeric node identity inside one load generation.
pub type NodeId = u64;

/// Id reserved for the root folder.
pub const ROOT_ID: NodeId = 0;

/// Generations count modulo 2^16 so that [`Handle::to_bits`] is lossless for
/// every handle a tree can issue.
pub(crate) const GENERATION_MASK: u32 = 0xFFFF;

/// Opaque address of a node.
///
/// A handle pairs the node id with the generation of the tree it was issued
/// by. Every `load` starts a new generation, so handles taken before a reload
/// no longer resolve even when the same id gets reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    id: NodeId,
    generation: u32,
}

impl Handle {
    pub(crate) fn new(id: NodeId, generation: u32) -> Self {
        Self { id, generation }
    }

    /// Node id this handle points at.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Generation of the tree that issued this handle.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Packs the handle into a single word for toolkits that store item
    /// identity as an integer: the generation in the top 16 bits, the id
    /// below. Ids above 2^48 are truncated.
    pub fn to_bits(&self) -> u64 {
        (((self.generation & GENERATION_MASK) as u64) << 48) | (self.id & 0xFFFF_FFFF_FFFF)
    }

    /// Inverse of [`Handle::to_bits`].
    pub fn from_bits(bits: u64) -> Self {
        Self {
            id: bits & 0xFFFF_FFFF_FFFF,
            generation: (bits >> 48) as u32 & GENERATION_MASK,
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.id, self.generation)
    }
}

/// Icon identity attached to a rendered cell. Drawing is up to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Folder,
    File,
    FileFull,
    Profile,
}

/// Value of one display cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayValue {
    pub text: String,
    pub icon: Option<Icon>,
}

impl DisplayValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon: None,
        }
    }

    pub fn with_icon(text: impl Into<String>, icon: Icon) -> Self {
        Self {
            text: text.into(),
            icon: Some(icon),
        }
    }
}
