//! Write-through persistence
//!
//! Saving a node first saves its parent, so ancestors always reach disk before
//! descendants. A folder write creates the directory and rewrites its
//! sidecar, then flushes dirty children; a leaf write hands the payload to
//! the adapter. Clean nodes are skipped.

use crate::adapter::LeafAdapter;
use crate::error::TreeError;
use crate::store::{node_path, sidecar};
use crate::tree::arena::NodeArena;
use crate::tree::node::NodeKind;
use crate::types::NodeId;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

/// Borrowed view of everything a save needs.
pub struct Persistence<'a, A: LeafAdapter> {
    pub arena: &'a mut NodeArena<A::Payload>,
    pub base: &'a Path,
    pub adapter: &'a A,
}

impl<'a, A: LeafAdapter> Persistence<'a, A> {
    /// Save `id` and, transitively, every dirty ancestor.
    pub fn save(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self
            .arena
            .get(id)
            .ok_or(TreeError::MissingNode(id))?;
        if !node.dirty {
            return Ok(());
        }
        if let Some(parent) = node.parent {
            self.save(parent)?;
        }
        // The parent's save flushes dirty children, this one included.
        if !self.arena.get(id).map(|node| node.dirty).unwrap_or(false) {
            return Ok(());
        }
        self.write(id)
    }

    /// Save every dirty node. Keeps going after a failure and returns the
    /// first error.
    pub fn flush(&mut self) -> Result<(), TreeError> {
        let dirty: Vec<NodeId> = self
            .arena
            .iter()
            .filter(|(_, node)| node.dirty)
            .map(|(id, _)| id)
            .collect();
        let mut first_error = None;
        for id in dirty {
            if let Err(e) = self.save(id) {
                error!("Could not save node {}: {}", id, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn write(&mut self, id: NodeId) -> Result<(), TreeError> {
        let is_folder = self
            .arena
            .get(id)
            .map(|node| node.is_folder())
            .unwrap_or(false);
        if is_folder {
            self.write_folder(id)
        } else {
            self.write_leaf(id)
        }
    }

    fn path(&self, id: NodeId) -> Result<std::path::PathBuf, TreeError> {
        node_path(self.arena, self.base, self.adapter, id)
            .ok_or(TreeError::MissingNode(id))
    }

    fn write_leaf(&mut self, id: NodeId) -> Result<(), TreeError> {
        debug!("Saving leaf {}", id);
        let path = self.path(id)?;
        let node = self
            .arena
            .get(id)
            .ok_or(TreeError::MissingNode(id))?;
        if let NodeKind::Leaf(payload) = &node.kind {
            if let Err(e) = self.adapter.save_leaf(&path, payload) {
                error!("Could not save '{}': {}", node.name, e);
                return Err(e);
            }
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.dirty = false;
        }
        Ok(())
    }

    fn write_folder(&mut self, id: NodeId) -> Result<(), TreeError> {
        debug!("Saving folder {}", id);
        let path = self.path(id)?;

        if path.exists() && !path.is_dir() {
            tracing::warn!("Replacing file {} with a directory", path.display());
            fs::remove_file(&path).map_err(|e| TreeError::io(&path, e))?;
        }
        if !path.exists() {
            fs::create_dir(&path).map_err(|e| TreeError::io(&path, e))?;
        }

        let children = self
            .arena
            .get(id)
            .map(|node| node.children.clone())
            .unwrap_or_default();
        if children.is_empty() {
            sidecar::remove(&path)?;
        } else {
            let order: Vec<String> = children
                .iter()
                .filter_map(|child| self.arena.get(*child))
                .map(|child| child.encoded.clone())
                .collect();
            sidecar::write_order(&path, &order)?;
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.dirty = false;
        }

        for child in children {
            let dirty = self.arena.get(child).map(|node| node.dirty).unwrap_or(false);
            if dirty {
                self.write(child)?;
            }
        }
        Ok(())
    }
}
