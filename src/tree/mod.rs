//! Tree Store
//!
//! An ordered tree of folders and leaves kept in lockstep with a directory on
//! disk. Every mutation updates the in-memory arena, writes the affected
//! entries through [`crate::store::persistence`], and then notifies the
//! registered observers. A failed mutation leaves the visible tree unchanged
//! and notifies nobody.

pub mod arena;
mod moves;
pub mod node;

use crate::adapter::LeafAdapter;
use crate::encoding;
use crate::error::TreeError;
use crate::observer::{ObserverHub, ObserverId, TreeEvent, TreeObserver};
use crate::store::persistence::Persistence;
use crate::store::sidecar::SIDECAR_STEM;
use crate::store::{self, loader};
use crate::types::{DisplayValue, Handle, Icon, NodeId, GENERATION_MASK, ROOT_ID};
use arena::NodeArena;
use node::{Node, NodeKind};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Default name of folders created through [`TreeStore::create_folder`].
pub const NEW_FOLDER_NAME: &str = "New Folder";

/// Filesystem-backed ordered tree, specialized by a [`LeafAdapter`].
pub struct TreeStore<A: LeafAdapter> {
    adapter: A,
    arena: NodeArena<A::Payload>,
    base_dir: PathBuf,
    generation: u32,
    observers: ObserverHub,
}

impl<A: LeafAdapter> TreeStore<A> {
    /// Open the tree stored under `base_dir`, creating the directory if it
    /// does not exist yet.
    pub fn open(base_dir: impl AsRef<Path>, adapter: A) -> Result<Self, TreeError> {
        let mut store = Self {
            adapter,
            arena: NodeArena::new(),
            base_dir: base_dir.as_ref().to_path_buf(),
            generation: 0,
            observers: ObserverHub::new(),
        };
        let base = store.base_dir.clone();
        store.load(base)?;
        Ok(store)
    }

    /// Discard the in-memory tree and rebuild it from `base_dir`.
    ///
    /// Every handle issued before the call becomes stale. Observers receive
    /// [`TreeEvent::Cleared`].
    pub fn load(&mut self, base_dir: impl AsRef<Path>) -> Result<(), TreeError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let arena = loader::load_tree(&base_dir, &self.adapter)?;
        self.arena = arena;
        self.base_dir = base_dir;
        self.generation = self.generation.wrapping_add(1) & GENERATION_MASK;
        self.observers.emit(TreeEvent::Cleared);
        Ok(())
    }

    /// Reload from the current base directory.
    pub fn reload(&mut self) -> Result<(), TreeError> {
        let base = self.base_dir.clone();
        self.load(base)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn root(&self) -> Handle {
        self.handle(ROOT_ID)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// True when the tree holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn subscribe(&mut self, observer: impl TreeObserver + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ---- handles ----------------------------------------------------------

    pub(crate) fn handle(&self, id: NodeId) -> Handle {
        Handle::new(id, self.generation)
    }

    pub(crate) fn resolve(&self, handle: Handle) -> Result<NodeId, TreeError> {
        if handle.generation() == self.generation && self.arena.contains(handle.id()) {
            Ok(handle.id())
        } else {
            Err(TreeError::InvalidHandle(handle))
        }
    }

    fn node(&self, handle: Handle) -> Result<&Node<A::Payload>, TreeError> {
        let id = self.resolve(handle)?;
        self.arena.get(id).ok_or(TreeError::InvalidHandle(handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_ok()
    }

    // ---- read accessors ---------------------------------------------------

    pub fn name(&self, handle: Handle) -> Result<&str, TreeError> {
        Ok(self.node(handle)?.name.as_str())
    }

    /// Parent of `handle`; `None` for the root.
    pub fn parent(&self, handle: Handle) -> Result<Option<Handle>, TreeError> {
        Ok(self.node(handle)?.parent.map(|id| self.handle(id)))
    }

    /// Children of a folder in display order. Leaves have none.
    pub fn children(&self, handle: Handle) -> Result<Vec<Handle>, TreeError> {
        Ok(self
            .node(handle)?
            .children
            .iter()
            .map(|id| self.handle(*id))
            .collect())
    }

    pub fn is_container(&self, handle: Handle) -> Result<bool, TreeError> {
        Ok(self.node(handle)?.is_folder())
    }

    pub fn leaf_payload(&self, handle: Handle) -> Result<&A::Payload, TreeError> {
        self.node(handle)?
            .payload()
            .ok_or(TreeError::NotALeaf(handle))
    }

    pub fn has_child_named(&self, parent: Handle, name: &str) -> Result<bool, TreeError> {
        let id = self.resolve(parent)?;
        Ok(self.arena.child_named(id, name).is_some())
    }

    pub fn is_dirty(&self, handle: Handle) -> Result<bool, TreeError> {
        Ok(self.node(handle)?.dirty)
    }

    /// First node, in id order, whose display name is `name`.
    pub fn find_by_name(&self, name: &str) -> Option<Handle> {
        self.arena
            .iter()
            .find(|(id, node)| *id != ROOT_ID && node.name == name)
            .map(|(id, _)| self.handle(id))
    }

    /// Every leaf with its payload, in id order.
    pub fn leaves(&self) -> impl Iterator<Item = (Handle, &A::Payload)> + '_ {
        self.arena
            .iter()
            .filter_map(move |(id, node)| node.payload().map(|payload| (self.handle(id), payload)))
    }

    /// `base`, or `base - N` for the smallest N no child of `parent` uses.
    pub fn unique_name(&self, parent: Handle, base: &str) -> Result<String, TreeError> {
        let id = self.resolve(parent)?;
        Ok(self.arena.unique_name(id, base))
    }

    /// On-disk path of a node. The root maps to the base directory.
    pub fn path_of(&self, handle: Handle) -> Result<PathBuf, TreeError> {
        let id = self.resolve(handle)?;
        self.node_path(id)
    }

    fn node_path(&self, id: NodeId) -> Result<PathBuf, TreeError> {
        store::node_path(&self.arena, &self.base_dir, &self.adapter, id)
            .ok_or(TreeError::MissingNode(id))
    }

    pub fn column_count(&self) -> usize {
        self.adapter.column_count()
    }

    /// Display value of one cell.
    pub fn value(&self, handle: Handle, column: usize) -> Result<DisplayValue, TreeError> {
        let node = self.node(handle)?;
        Ok(match &node.kind {
            NodeKind::Folder if column == 0 => DisplayValue::with_icon(&node.name, Icon::Folder),
            NodeKind::Folder => DisplayValue::default(),
            NodeKind::Leaf(payload) => self.adapter.render_column(&node.name, payload, column),
        })
    }

    // ---- persistence ------------------------------------------------------

    fn persistence(&mut self) -> Persistence<'_, A> {
        Persistence {
            arena: &mut self.arena,
            base: &self.base_dir,
            adapter: &self.adapter,
        }
    }

    pub(crate) fn save(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.persistence().save(id)
    }

    /// Save a node and log instead of failing. Used after the structural
    /// change already reached disk; the node stays dirty for the next flush.
    pub(crate) fn save_or_warn(&mut self, id: NodeId) {
        if let Err(e) = self.save(id) {
            warn!("Could not persist node {}, left dirty: {}", id, e);
        }
    }

    pub(crate) fn mark_dirty(&mut self, id: NodeId) {
        if let Some(node) = self.arena.get_mut(id) {
            node.dirty = true;
        }
    }

    /// Write every dirty node to disk.
    pub fn flush(&mut self) -> Result<(), TreeError> {
        self.persistence().flush()
    }

    // ---- creation ---------------------------------------------------------

    fn folder_id(&self, handle: Handle) -> Result<NodeId, TreeError> {
        let id = self.resolve(handle)?;
        match self.arena.get(id) {
            Some(node) if node.is_folder() => Ok(id),
            _ => Err(TreeError::NotAFolder(handle)),
        }
    }

    fn validate_name(name: &str) -> Result<(), TreeError> {
        if name.is_empty() {
            return Err(TreeError::EmptyName);
        }
        if name == SIDECAR_STEM {
            return Err(TreeError::ReservedName(name.to_string()));
        }
        Ok(())
    }

    /// Create a folder named "New Folder" (uniquified) under `parent`.
    pub fn create_folder(&mut self, parent: Handle) -> Result<Handle, TreeError> {
        let parent_id = self.folder_id(parent)?;
        let name = self.arena.unique_name(parent_id, NEW_FOLDER_NAME);
        info!(
            "Creating folder '{}' under [{}]'{}'",
            name,
            parent_id,
            self.arena.get(parent_id).map(|n| n.name.as_str()).unwrap_or("")
        );
        let encoded = encoding::encode(&name);
        self.insert_new(parent_id, Node::folder(Some(parent_id), name, encoded))
    }

    /// Create a leaf under `parent`, appending " - N" to `name` until it is
    /// unique among the siblings.
    pub fn leaf_create(
        &mut self,
        parent: Handle,
        payload: A::Payload,
        name: &str,
    ) -> Result<Handle, TreeError> {
        let parent_id = self.folder_id(parent)?;
        Self::validate_name(name)?;
        let name = self.arena.unique_name(parent_id, name);
        info!("Creating leaf '{}' under [{}]", name, parent_id);
        let encoded = encoding::encode(&name);
        self.insert_new(parent_id, Node::leaf(parent_id, name, encoded, payload))
    }

    /// Create a leaf named exactly `name` under `parent`. Fails with
    /// [`TreeError::NameCollision`] if a sibling already uses the name.
    pub fn leaf_insert(
        &mut self,
        name: &str,
        payload: A::Payload,
        parent: Handle,
    ) -> Result<Handle, TreeError> {
        let parent_id = self.folder_id(parent)?;
        Self::validate_name(name)?;
        if self.arena.child_named(parent_id, name).is_some() {
            return Err(TreeError::NameCollision(name.to_string()));
        }
        info!("Inserting leaf '{}' under [{}]", name, parent_id);
        let encoded = encoding::encode(name);
        self.insert_new(
            parent_id,
            Node::leaf(parent_id, name.to_string(), encoded, payload),
        )
    }

    /// Reject entry names the adapter keeps out of the ordered tree.
    pub(crate) fn check_reserved(
        &self,
        parent_id: NodeId,
        entry: &str,
        name: &str,
    ) -> Result<(), TreeError> {
        if parent_id == ROOT_ID && self.adapter.is_reserved_root_entry(entry) {
            warn!("'{}' is reserved at the top level", name);
            return Err(TreeError::ReservedName(name.to_string()));
        }
        Ok(())
    }

    fn insert_new(&mut self, parent_id: NodeId, node: Node<A::Payload>) -> Result<Handle, TreeError> {
        self.check_reserved(parent_id, &store::entry_name(&self.adapter, &node), &node.name)?;
        let id = self.arena.insert_child(node);
        self.mark_dirty(parent_id);

        if let Err(e) = self.save(id) {
            error!("Could not create node under [{}]: {}", parent_id, e);
            self.arena.detach(id);
            self.arena.remove_subtree(id);
            self.mark_dirty(parent_id);
            self.save_or_warn(parent_id);
            return Err(e);
        }

        let parent = self.handle(parent_id);
        let item = self.handle(id);
        self.observers.added(parent, item);
        Ok(item)
    }

    // ---- mutation ---------------------------------------------------------

    /// Replace the payload of a leaf and save it.
    pub fn leaf_replace(&mut self, handle: Handle, payload: A::Payload) -> Result<Handle, TreeError> {
        self.update_leaf(handle, move |current| *current = payload)?;
        Ok(handle)
    }

    /// Edit the payload of a leaf in place, then save it. On a failed save
    /// the previous payload is restored.
    pub fn update_leaf(
        &mut self,
        handle: Handle,
        edit: impl FnOnce(&mut A::Payload),
    ) -> Result<(), TreeError> {
        let id = self.resolve(handle)?;
        let node = self
            .arena
            .get_mut(id)
            .ok_or(TreeError::InvalidHandle(handle))?;
        let Some(payload) = node.payload_mut() else {
            warn!("Can only replace leaves, [{}] is a folder", id);
            return Err(TreeError::NotALeaf(handle));
        };
        let previous = payload.clone();
        edit(payload);
        node.dirty = true;

        if let Err(e) = self.save(id) {
            if let Some(payload) = self.arena.get_mut(id).and_then(|n| n.payload_mut()) {
                *payload = previous;
            }
            return Err(e);
        }

        self.observers.changed(handle);
        Ok(())
    }

    /// Rename a node, moving its on-disk entry accordingly.
    pub fn rename(&mut self, handle: Handle, new_name: &str) -> Result<(), TreeError> {
        let id = self.resolve(handle)?;
        if id == ROOT_ID {
            return Err(TreeError::RootNode);
        }
        Self::validate_name(new_name).map_err(|e| {
            warn!("Could not rename [{}] to '{}': {}", id, new_name, e);
            e
        })?;

        let node = self.arena.get(id).ok_or(TreeError::InvalidHandle(handle))?;
        if node.name == new_name {
            return Ok(());
        }
        let parent_id = node.parent.ok_or(TreeError::RootNode)?;
        if self.arena.child_named(parent_id, new_name).is_some() {
            return Err(TreeError::NameCollision(new_name.to_string()));
        }

        let encoded = encoding::encode(new_name);
        let path_old = self.node_path(id)?;
        let file_name = if node.is_folder() {
            encoded.clone()
        } else {
            self.adapter.leaf_file_name(&encoded)
        };
        self.check_reserved(parent_id, &file_name, new_name)?;
        let path_new = path_old.with_file_name(file_name);

        if store::occupied(&path_new) {
            error!(
                "Could not rename '{}' to '{}': target exists",
                path_old.display(),
                path_new.display()
            );
            return Err(TreeError::NameCollision(new_name.to_string()));
        }
        if store::occupied(&path_old) {
            fs::rename(&path_old, &path_new).map_err(|e| {
                error!(
                    "Could not rename '{}' to '{}': {}",
                    path_old.display(),
                    path_new.display(),
                    e
                );
                TreeError::io(&path_old, e)
            })?;
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.name = new_name.to_string();
            node.encoded = encoded;
            node.dirty = true;
        }
        self.mark_dirty(parent_id);
        self.save_or_warn(id);

        self.observers.changed(handle);
        Ok(())
    }

    /// Delete a node and its whole subtree, on disk first.
    pub fn remove(&mut self, handle: Handle) -> Result<(), TreeError> {
        let id = self.resolve(handle)?;
        if id == ROOT_ID {
            return Err(TreeError::RootNode);
        }
        let path = self.node_path(id)?;
        if let Err(e) = store::remove_path(&path) {
            error!("Could not delete '{}': {}", path.display(), e);
            return Err(e);
        }

        let parent_id = self
            .arena
            .get(id)
            .and_then(|node| node.parent)
            .ok_or(TreeError::RootNode)?;
        self.arena.detach(id);
        let removed = self.arena.remove_subtree(id);
        info!("Removed [{}] and {} descendants", id, removed.len().saturating_sub(1));

        self.mark_dirty(parent_id);
        self.save_or_warn(parent_id);

        let parent = self.handle(parent_id);
        self.observers.deleted(parent, handle);
        Ok(())
    }
}

impl<A: LeafAdapter> std::fmt::Debug for TreeStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore")
            .field("base_dir", &self.base_dir)
            .field("generation", &self.generation)
            .field("nodes", &self.arena.len())
            .field("observers", &self.observers)
            .finish()
    }
}
