//! Error types
//!
//! `TreeError` is the single failure type for every tree operation, including
//! the loader's name decoding. `ApiError` covers the setup surface
//! (configuration and logging).

use crate::encoding::DecodeError;
use crate::types::{Handle, NodeId};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a tree operation.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("handle {0} does not resolve to a live node")]
    InvalidHandle(Handle),

    #[error("a sibling named '{0}' already exists")]
    NameCollision(String),

    #[error("'{0}' is a reserved name")]
    ReservedName(String),

    #[error("name must not be empty")]
    EmptyName,

    #[error("node {0} is missing from the tree")]
    MissingNode(NodeId),

    #[error("operation not permitted on the root node")]
    RootNode,

    #[error("node {0} is not a folder")]
    NotAFolder(Handle),

    #[error("node {0} is not a leaf")]
    NotALeaf(Handle),

    #[error("cannot move node {item} into {target}: target is the node itself or one of its descendants")]
    RecursiveTarget { item: Handle, target: Handle },

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("payload error: {0}")]
    Payload(String),
}

impl TreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TreeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Setup errors raised while loading configuration or installing logging.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
