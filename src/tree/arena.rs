//! Node arena
//!
//! Id → node map with the structural bookkeeping the tree store builds on:
//! sibling lookup, subtree collection, ancestry checks and path segments.
//! Nothing here touches the filesystem.

use crate::tree::node::Node;
use crate::types::{NodeId, ROOT_ID};
use std::collections::BTreeMap;

/// Owner of every node of one tree generation.
#[derive(Debug)]
pub struct NodeArena<P> {
    nodes: BTreeMap<NodeId, Node<P>>,
    next_id: NodeId,
}

impl<P> NodeArena<P> {
    /// Arena holding only the root folder.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        let mut root = Node::folder(None, String::new(), String::new());
        root.dirty = false;
        nodes.insert(ROOT_ID, root);
        Self {
            nodes,
            next_id: ROOT_ID + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<P>> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<P>> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<P>)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Insert `node` as the last child of its parent and return its new id.
    ///
    /// The parent must exist; callers validate before inserting.
    pub fn insert_child(&mut self, node: Node<P>) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }
        self.nodes.insert(id, node);
        id
    }

    /// Detach `id` from its parent's child list. Returns the former index.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent_id = self.nodes.get(&id)?.parent?;
        let parent = self.nodes.get_mut(&parent_id)?;
        let index = parent.children.iter().position(|child| *child == id)?;
        parent.children.remove(index);
        Some(index)
    }

    /// Attach a detached node under `parent` at `index` (clamped).
    pub fn attach(&mut self, id: NodeId, parent_id: NodeId, index: usize) {
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            let index = index.min(parent.children.len());
            parent.children.insert(index, id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(parent_id);
        }
    }

    /// Remove `id` and every descendant from the map. The caller detaches
    /// `id` from its parent first.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        let removed = self.subtree(id);
        for node_id in &removed {
            self.nodes.remove(node_id);
        }
        removed
    }

    /// `id` followed by all descendants in pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// True if `candidate` is `ancestor` or lies below it.
    pub fn is_within(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|node| node.parent);
        }
        false
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes.get(&id)?.parent?;
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .position(|child| *child == id)
    }

    /// Child of `parent` whose display name is `name`.
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes.get(&parent)?.children.iter().copied().find(|child| {
            self.nodes
                .get(child)
                .map(|node| node.name == name)
                .unwrap_or(false)
        })
    }

    /// Child of `parent` whose encoded name is `encoded`.
    pub fn child_encoded(&self, parent: NodeId, encoded: &str) -> Option<NodeId> {
        self.nodes.get(&parent)?.children.iter().copied().find(|child| {
            self.nodes
                .get(child)
                .map(|node| node.encoded == encoded)
                .unwrap_or(false)
        })
    }

    /// Ancestors of `id` from the root's first child down to `id` itself.
    pub fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ROOT_ID {
                break;
            }
            chain.push(node_id);
            current = self.nodes.get(&node_id).and_then(|node| node.parent);
        }
        chain.reverse();
        chain
    }

    /// `base`, `base - 1`, `base - 2`, … : first name no child of `parent` uses.
    pub fn unique_name(&self, parent: NodeId, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut postfix = 0usize;
        while self.child_named(parent, &candidate).is_some() {
            postfix += 1;
            candidate = format!("{} - {}", base, postfix);
        }
        candidate
    }
}

impl<P> Default for NodeArena<P> {
    fn default() -> Self {
        Self::new()
    }
}
