//! Cold load
//!
//! Rebuilds a [`NodeArena`] from a base directory, depth-first. Entries that
//! cannot be decoded or deserialized are logged and skipped; they never abort
//! the load.

use crate::adapter::{EntryInfo, LeafAdapter};
use crate::encoding;
use crate::error::TreeError;
use crate::store::sidecar::{self, SidecarState};
use crate::store::prepare_base_dir;
use crate::tree::arena::NodeArena;
use crate::tree::node::Node;
use crate::types::{NodeId, ROOT_ID};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, trace, warn};

/// Load the tree stored under `base`, creating the directory if needed.
pub fn load_tree<A: LeafAdapter>(
    base: &Path,
    adapter: &A,
) -> Result<NodeArena<A::Payload>, TreeError> {
    debug!("Loading tree from {}", base.display());
    prepare_base_dir(base)?;
    let mut arena = NodeArena::new();
    load_directory(&mut arena, adapter, base, ROOT_ID)?;
    debug!("Loaded {} nodes from {}", arena.len(), base.display());
    Ok(arena)
}

/// Entries of `dir` in byte order of their names.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, TreeError> {
    let entries = fs::read_dir(dir).map_err(|e| TreeError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => warn!("Failed to read directory entry in {}: {}", dir.display(), e),
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_directory<A: LeafAdapter>(
    arena: &mut NodeArena<A::Payload>,
    adapter: &A,
    dir: &Path,
    folder_id: NodeId,
) -> Result<(), TreeError> {
    for path in sorted_entries(dir)? {
        if sidecar::is_reserved_entry(&path) {
            continue;
        }
        let file_name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_string(),
            None => {
                warn!("Skipping non UTF-8 entry {:?}", path);
                continue;
            }
        };
        if folder_id == ROOT_ID && adapter.is_reserved_root_entry(&file_name) {
            trace!("Skipping reserved entry {}", path.display());
            continue;
        }
        let entry = EntryInfo {
            path: &path,
            file_name: &file_name,
            is_dir: path.is_dir(),
        };

        if adapter.is_leaf(&entry) {
            trace!("Leaf detected: {}", path.display());
            load_leaf(arena, adapter, &path, &file_name, folder_id);
        } else if entry.is_dir {
            let Some(child_id) = insert_decoded(arena, folder_id, &file_name, &path, None) else {
                continue;
            };
            if let Err(e) = load_directory(arena, adapter, &path, child_id) {
                error!("Could not load folder {}: {}", path.display(), e);
            }
        } else {
            trace!("Ignoring {}", path.display());
        }
    }

    restore_order(arena, dir, folder_id);
    Ok(())
}

fn load_leaf<A: LeafAdapter>(
    arena: &mut NodeArena<A::Payload>,
    adapter: &A,
    path: &Path,
    file_name: &str,
    parent: NodeId,
) {
    let payload = match adapter.load_leaf(path) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Could not load '{}': {}", path.display(), e);
            return;
        }
    };
    let encoded = adapter.encoded_from_file_name(file_name).to_string();
    insert_decoded(arena, parent, &encoded, path, Some(payload));
}

/// Decode `encoded` and insert a clean folder (no payload) or leaf under
/// `parent`. Returns `None` when the entry is skipped.
fn insert_decoded<P>(
    arena: &mut NodeArena<P>,
    parent: NodeId,
    encoded: &str,
    path: &Path,
    payload: Option<P>,
) -> Option<NodeId> {
    let name = match encoding::decode(encoded) {
        Ok(name) => name,
        Err(e) => {
            error!("Could not decode '{}': {}", path.display(), e);
            return None;
        }
    };
    if name.is_empty() || arena.child_named(parent, &name).is_some() {
        warn!(
            "Skipping '{}': display name '{}' is empty or already taken",
            path.display(),
            name
        );
        return None;
    }

    let mut node = match payload {
        Some(payload) => Node::leaf(parent, name, encoded.to_string(), payload),
        None => Node::folder(Some(parent), name, encoded.to_string()),
    };
    node.dirty = false;
    Some(arena.insert_child(node))
}

/// Sort the children of `folder_id` by its sidecar and rewrite the sidecar
/// when it is missing, malformed, or disagrees with the result.
fn restore_order<P>(
    arena: &mut NodeArena<P>,
    dir: &Path,
    folder_id: NodeId,
) {
    let Some(folder) = arena.get(folder_id) else {
        return;
    };
    if folder.children.is_empty() {
        return;
    }

    let mut children = folder.children.clone();
    let key = |id: &NodeId| {
        arena
            .get(*id)
            .map(|node| node.encoded.clone())
            .unwrap_or_default()
    };

    let stored = match sidecar::read_order(dir) {
        SidecarState::Order(order) => {
            sidecar::sort_by_order(&mut children, &order, key);
            Some(order)
        }
        SidecarState::Missing => {
            warn!("No {} in {}, keeping directory order", sidecar::SIDECAR_FILE, dir.display());
            None
        }
        SidecarState::Malformed(reason) => {
            error!(
                "Could not sort {}: {} is malformed: {}",
                dir.display(),
                sidecar::SIDECAR_FILE,
                reason
            );
            None
        }
    };

    let current: Vec<String> = children.iter().map(key).collect();
    if let Some(folder) = arena.get_mut(folder_id) {
        folder.children = children;
    }

    if stored.as_deref() != Some(current.as_slice()) {
        if let Err(e) = sidecar::write_order(dir, &current) {
            warn!("Could not rewrite order of {}: {}", dir.display(), e);
        }
    }
}
