//! Tree node representation

use crate::types::NodeId;

/// Node kind. Only leaves carry a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<P> {
    Folder,
    Leaf(P),
}

/// One entry of the tree, mirrored by a directory or leaf entry on disk.
#[derive(Debug, Clone)]
pub struct Node<P> {
    pub parent: Option<NodeId>,
    pub name: String,
    pub encoded: String,
    pub kind: NodeKind<P>,
    /// Display order; empty for leaves.
    pub children: Vec<NodeId>,
    pub dirty: bool,
}

impl<P> Node<P> {
    pub fn folder(parent: Option<NodeId>, name: String, encoded: String) -> Self {
        Self {
            parent,
            name,
            encoded,
            kind: NodeKind::Folder,
            children: Vec::new(),
            dirty: true,
        }
    }

    pub fn leaf(parent: NodeId, name: String, encoded: String, payload: P) -> Self {
        Self {
            parent: Some(parent),
            name,
            encoded,
            kind: NodeKind::Leaf(payload),
            children: Vec::new(),
            dirty: true,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn payload(&self) -> Option<&P> {
        match &self.kind {
            NodeKind::Leaf(payload) => Some(payload),
            NodeKind::Folder => None,
        }
    }

    pub fn payload_mut(&mut self) -> Option<&mut P> {
        match &mut self.kind {
            NodeKind::Leaf(payload) => Some(payload),
            NodeKind::Folder => None,
        }
    }
}
