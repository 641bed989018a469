//! Leaf adapters
//!
//! A tree store is specialized for one collection by a [`LeafAdapter`]: it
//! decides which directory entries are leaves, how an encoded name maps to an
//! on-disk entry, how payloads are read and written, and how they render.

use crate::error::TreeError;
use crate::types::DisplayValue;
use std::path::Path;

/// Directory entry as seen by the loader.
#[derive(Debug, Clone, Copy)]
pub struct EntryInfo<'a> {
    pub path: &'a Path,
    pub file_name: &'a str,
    pub is_dir: bool,
}

/// Per-collection hooks used by [`crate::tree::TreeStore`].
pub trait LeafAdapter {
    /// Payload carried by every leaf of this collection.
    type Payload: Clone + Default + std::fmt::Debug;

    /// Classify a directory entry. Directories not claimed as leaves become
    /// folders; regular files not claimed are ignored.
    fn is_leaf(&self, entry: &EntryInfo<'_>) -> bool;

    /// On-disk entry name for a leaf with the given encoded name.
    fn leaf_file_name(&self, encoded: &str) -> String {
        encoded.to_string()
    }

    /// Encoded name of a leaf entry found on disk.
    fn encoded_from_file_name<'n>(&self, file_name: &'n str) -> &'n str {
        file_name
    }

    /// Entries directly under the base directory that the collection keeps
    /// outside the ordered tree. The loader skips them.
    fn is_reserved_root_entry(&self, _file_name: &str) -> bool {
        false
    }

    /// Read a payload. Empty or missing content yields the default payload.
    fn load_leaf(&self, path: &Path) -> Result<Self::Payload, TreeError>;

    /// Write a payload to the leaf's on-disk entry.
    fn save_leaf(&self, path: &Path, payload: &Self::Payload) -> Result<(), TreeError>;

    /// Number of display columns; column 0 is always the name.
    fn column_count(&self) -> usize {
        1
    }

    /// Render one column of a leaf.
    fn render_column(&self, name: &str, payload: &Self::Payload, column: usize) -> DisplayValue;
}
