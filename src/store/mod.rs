//! On-disk mirror of a tree
//!
//! Maps nodes to filesystem paths, rebuilds a tree from a directory
//! ([`loader`]) and writes dirty nodes back ([`persistence`]).

pub mod loader;
pub mod persistence;
pub mod sidecar;

use crate::adapter::LeafAdapter;
use crate::error::TreeError;
use crate::tree::arena::NodeArena;
use crate::tree::node::Node;
use crate::types::NodeId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of a node's entry inside its parent directory.
pub fn entry_name<A: LeafAdapter>(adapter: &A, node: &Node<A::Payload>) -> String {
    if node.is_folder() {
        node.encoded.clone()
    } else {
        adapter.leaf_file_name(&node.encoded)
    }
}

/// Absolute path of `id` under `base`. The root maps to `base` itself.
pub fn node_path<A: LeafAdapter>(
    arena: &NodeArena<A::Payload>,
    base: &Path,
    adapter: &A,
    id: NodeId,
) -> Option<PathBuf> {
    let mut path = base.to_path_buf();
    for node_id in arena.lineage(id) {
        let node = arena.get(node_id)?;
        path.push(entry_name(adapter, node));
    }
    Some(path)
}

/// True if anything (file, directory, dangling link) occupies `path`.
pub fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Recursively delete whatever is at `path`. A path that never reached disk
/// counts as deleted.
pub fn remove_path(path: &Path) -> Result<(), TreeError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(TreeError::io(path, e)),
    };
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| TreeError::io(path, e))
}

/// Make sure `base` is a directory, replacing a stray file of the same name.
pub fn prepare_base_dir(base: &Path) -> Result<(), TreeError> {
    if base.as_os_str().is_empty() {
        return Err(TreeError::io(
            base,
            std::io::Error::new(ErrorKind::InvalidInput, "no base directory provided"),
        ));
    }
    if base.exists() && !base.is_dir() {
        tracing::warn!("Replacing file {} with a directory", base.display());
        fs::remove_file(base).map_err(|e| TreeError::io(base, e))?;
    }
    fs::create_dir_all(base).map_err(|e| TreeError::io(base, e))
}
