//! fstree: Ordered Document Trees on Plain Directories
//!
//! An in-memory ordered tree of folders and leaves kept consistent with a
//! directory on disk. Folders are directories, leaves are collection-defined
//! entries, and each folder's display order lives in an `.index.json`
//! sidecar. Nodes are addressed through generation-checked [`Handle`]s and
//! every mutation is announced to registered observers.

pub mod adapter;
pub mod collections;
pub mod config;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod observer;
pub mod store;
pub mod tree;
pub mod types;

pub use adapter::{EntryInfo, LeafAdapter};
pub use collections::messages::{MessageAdapter, MessageTree, QoS, SavedMessage};
pub use collections::profiles::{BrokerOptions, ClientOptions, Profile, ProfileAdapter, ProfileTree};
pub use error::{ApiError, TreeError};
pub use observer::{ObserverId, TreeEvent, TreeObserver};
pub use tree::TreeStore;
pub use types::{DisplayValue, Handle, Icon, NodeId};
