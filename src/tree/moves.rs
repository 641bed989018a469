//! Reparent and reorder
//!
//! Every move reduces to "place `item` as a child of `parent` at final
//! position `index`". Validation completes before anything touches disk; the
//! physical rename is the last fallible step before the in-memory splice.

use super::TreeStore;
use crate::adapter::LeafAdapter;
use crate::error::TreeError;
use crate::store;
use crate::types::{Handle, NodeId, ROOT_ID};
use std::fs;
use tracing::{debug, error, info};

impl<A: LeafAdapter> TreeStore<A> {
    /// Move `item` into `parent` so that it ends up at `index`. Indexes past
    /// the end are clamped to the last slot.
    pub fn move_inside_at_index(
        &mut self,
        item: Handle,
        parent: Handle,
        index: usize,
    ) -> Result<Handle, TreeError> {
        let (item_id, parent_id) = self.validate_move(item, parent)?;
        self.move_to(item_id, parent_id, index)
    }

    pub fn move_inside_first(&mut self, item: Handle, parent: Handle) -> Result<Handle, TreeError> {
        self.move_inside_at_index(item, parent, 0)
    }

    pub fn move_inside_last(&mut self, item: Handle, parent: Handle) -> Result<Handle, TreeError> {
        self.move_inside_at_index(item, parent, usize::MAX)
    }

    /// Move `item` so that it sits immediately before `sibling`.
    pub fn move_before(&mut self, item: Handle, sibling: Handle) -> Result<Handle, TreeError> {
        self.move_next_to(item, sibling, 0)
    }

    /// Move `item` so that it sits immediately after `sibling`.
    pub fn move_after(&mut self, item: Handle, sibling: Handle) -> Result<Handle, TreeError> {
        self.move_next_to(item, sibling, 1)
    }

    fn move_next_to(
        &mut self,
        item: Handle,
        sibling: Handle,
        offset: usize,
    ) -> Result<Handle, TreeError> {
        let item_id = self.resolve(item)?;
        let sibling_id = self.resolve(sibling)?;
        if item_id == sibling_id {
            return Err(TreeError::InvalidMove(format!(
                "{} cannot be placed next to itself",
                item
            )));
        }
        let Some(parent_id) = self.arena.get(sibling_id).and_then(|node| node.parent) else {
            return Err(TreeError::InvalidMove(
                "the root has no siblings".to_string(),
            ));
        };

        let (item_id, parent_id) = self.validate_move(item, self.handle(parent_id))?;
        let sibling_index = self
            .arena
            .index_in_parent(sibling_id)
            .ok_or(TreeError::MissingNode(sibling_id))?;
        let mut index = sibling_index + offset;
        // The final index is counted after `item` leaves its current slot.
        if let Some(current) = self.current_index_in(item_id, parent_id) {
            if current < sibling_index {
                index -= 1;
            }
        }
        self.move_to(item_id, parent_id, index)
    }

    fn current_index_in(&self, item_id: NodeId, parent_id: NodeId) -> Option<usize> {
        let node = self.arena.get(item_id)?;
        if node.parent == Some(parent_id) {
            self.arena.index_in_parent(item_id)
        } else {
            None
        }
    }

    /// Resolve both handles and reject moves of the root or into a leaf.
    fn validate_move(&self, item: Handle, parent: Handle) -> Result<(NodeId, NodeId), TreeError> {
        let item_id = self.resolve(item)?;
        if item_id == ROOT_ID {
            return Err(TreeError::RootNode);
        }
        let parent_id = self.resolve(parent)?;
        if !self.arena.get(parent_id).map(|n| n.is_folder()).unwrap_or(false) {
            return Err(TreeError::NotAFolder(parent));
        }
        if item_id == parent_id {
            info!("Could not move {}: item is the target", item);
            return Err(TreeError::RecursiveTarget { item, target: parent });
        }
        Ok((item_id, parent_id))
    }

    fn move_to(&mut self, item_id: NodeId, parent_id: NodeId, index: usize) -> Result<Handle, TreeError> {
        let item = self.handle(item_id);
        let old_parent_id = self
            .arena
            .get(item_id)
            .and_then(|node| node.parent)
            .ok_or(TreeError::RootNode)?;

        if old_parent_id == parent_id {
            let siblings = self
                .arena
                .get(parent_id)
                .map(|node| node.children.len())
                .unwrap_or(0);
            let target = index.min(siblings.saturating_sub(1));
            if self.arena.index_in_parent(item_id) == Some(target) {
                debug!("Move of [{}] to index {} is a no-op", item_id, target);
                return Ok(item);
            }
            info!("Reordering [{}] to index {} in [{}]", item_id, target, parent_id);
            self.arena.detach(item_id);
            self.arena.attach(item_id, parent_id, target);
            self.mark_dirty(parent_id);
            self.save_or_warn(parent_id);
            self.notify_moved(item_id, old_parent_id, parent_id);
            return Ok(item);
        }

        if self.arena.is_within(parent_id, item_id) {
            info!("Could not move [{}]: target [{}] is inside it", item_id, parent_id);
            return Err(TreeError::RecursiveTarget {
                item,
                target: self.handle(parent_id),
            });
        }

        let node = self.arena.get(item_id).ok_or(TreeError::MissingNode(item_id))?;
        // Disk tokens the encoder would never produce can still decode to a
        // sibling's display name, so both keys are checked.
        if self.arena.child_encoded(parent_id, &node.encoded).is_some()
            || self.arena.child_named(parent_id, &node.name).is_some()
        {
            info!("Could not move [{}]: '{}' exists in [{}]", item_id, node.name, parent_id);
            return Err(TreeError::NameCollision(node.name.clone()));
        }
        let entry = store::entry_name(&self.adapter, node);
        self.check_reserved(parent_id, &entry, &node.name)?;
        let path_old = self.node_path(item_id)?;
        let path_new = self.node_path(parent_id)?.join(entry);
        if store::occupied(&path_new) {
            error!("Could not move item: '{}' exists", path_new.display());
            return Err(TreeError::NameCollision(node.name.clone()));
        }
        if store::occupied(&path_old) {
            fs::rename(&path_old, &path_new).map_err(|e| {
                error!(
                    "Could not move item: failed to rename '{}' to '{}': {}",
                    path_old.display(),
                    path_new.display(),
                    e
                );
                TreeError::io(&path_old, e)
            })?;
        }

        let siblings = self
            .arena
            .get(parent_id)
            .map(|node| node.children.len())
            .unwrap_or(0);
        let target = index.min(siblings);
        info!(
            "Moving [{}] from [{}] into [{}] at index {}",
            item_id, old_parent_id, parent_id, target
        );
        self.arena.detach(item_id);
        self.arena.attach(item_id, parent_id, target);

        self.mark_dirty(item_id);
        self.mark_dirty(parent_id);
        self.mark_dirty(old_parent_id);
        self.save_or_warn(parent_id);
        self.save_or_warn(old_parent_id);
        self.save_or_warn(item_id);

        self.notify_moved(item_id, old_parent_id, parent_id);
        Ok(item)
    }

    /// Announce a move as removal from the old parent followed by insertion
    /// of the item and, in pre-order, each of its descendants.
    fn notify_moved(&mut self, item_id: NodeId, old_parent_id: NodeId, parent_id: NodeId) {
        let item = self.handle(item_id);
        self.observers.deleted(self.handle(old_parent_id), item);
        self.observers.added(self.handle(parent_id), item);

        let descendants: Vec<(NodeId, NodeId)> = self
            .arena
            .subtree(item_id)
            .into_iter()
            .skip(1)
            .filter_map(|id| self.arena.get(id).and_then(|n| n.parent).map(|p| (p, id)))
            .collect();
        for (parent, child) in descendants {
            self.observers.added(self.handle(parent), self.handle(child));
        }
    }
}
