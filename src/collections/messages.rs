//! Saved messages
//!
//! Leaves are `<encoded>.json` files holding one MQTT message each. An empty
//! file stands for the default message.

use crate::adapter::{EntryInfo, LeafAdapter};
use crate::collections::extract;
use crate::error::TreeError;
use crate::tree::TreeStore;
use crate::types::{DisplayValue, Handle, Icon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const EXTENSION: &str = ".json";

/// Default name of messages created through [`MessageTree::create_message`].
pub const NEW_MESSAGE_NAME: &str = "New Message";

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum QoS {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl From<u8> for QoS {
    fn from(value: u8) -> Self {
        match value {
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::AtMostOnce,
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        match qos {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// Payload of a message leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SavedMessage {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retained: bool,
}

impl SavedMessage {
    /// Build a message from JSON, defaulting every missing or mistyped
    /// field. QoS values above 2 fall back to 0.
    pub fn from_json(data: &Value) -> Self {
        let qos = extract::<u64>(data, "qos")
            .and_then(|qos| u8::try_from(qos).ok())
            .map(QoS::from)
            .unwrap_or_default();
        Self {
            topic: extract(data, "topic").unwrap_or_default(),
            payload: extract(data, "payload").unwrap_or_default(),
            qos,
            retained: extract(data, "retained").unwrap_or(false),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Adapter for trees of saved messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageAdapter;

impl LeafAdapter for MessageAdapter {
    type Payload = SavedMessage;

    fn is_leaf(&self, entry: &EntryInfo<'_>) -> bool {
        !entry.is_dir && entry.file_name.ends_with(EXTENSION)
    }

    fn leaf_file_name(&self, encoded: &str) -> String {
        format!("{}{}", encoded, EXTENSION)
    }

    fn encoded_from_file_name<'n>(&self, file_name: &'n str) -> &'n str {
        file_name.strip_suffix(EXTENSION).unwrap_or(file_name)
    }

    fn load_leaf(&self, path: &Path) -> Result<SavedMessage, TreeError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SavedMessage::default()),
            Err(e) => return Err(TreeError::io(path, e)),
        };
        if content.trim().is_empty() {
            return Ok(SavedMessage::default());
        }
        let data: Value = serde_json::from_str(&content)
            .map_err(|e| TreeError::Payload(format!("{}: {}", path.display(), e)))?;
        Ok(SavedMessage::from_json(&data))
    }

    fn save_leaf(&self, path: &Path, payload: &SavedMessage) -> Result<(), TreeError> {
        let json = serde_json::to_string_pretty(payload)
            .map_err(|e| TreeError::Payload(e.to_string()))?;
        fs::write(path, json).map_err(|e| TreeError::io(path, e))
    }

    fn render_column(&self, name: &str, payload: &SavedMessage, _column: usize) -> DisplayValue {
        let icon = if payload.is_empty() {
            Icon::File
        } else {
            Icon::FileFull
        };
        DisplayValue::with_icon(name, icon)
    }
}

/// Tree of saved messages.
pub type MessageTree = TreeStore<MessageAdapter>;

impl TreeStore<MessageAdapter> {
    /// Create a message named "New Message" (uniquified) under `parent`.
    pub fn create_message(
        &mut self,
        parent: Handle,
        message: SavedMessage,
    ) -> Result<Handle, TreeError> {
        self.leaf_create(parent, message, NEW_MESSAGE_NAME)
    }

    /// Store `message` under exactly `name`.
    pub fn insert_message(
        &mut self,
        name: &str,
        message: SavedMessage,
        parent: Handle,
    ) -> Result<Handle, TreeError> {
        self.leaf_insert(name, message, parent)
    }

    pub fn replace_message(
        &mut self,
        handle: Handle,
        message: SavedMessage,
    ) -> Result<Handle, TreeError> {
        self.leaf_replace(handle, message)
    }

    pub fn message(&self, handle: Handle) -> Result<&SavedMessage, TreeError> {
        self.leaf_payload(handle)
    }

    /// Every non-empty topic used by a stored message.
    pub fn known_topics(&self) -> BTreeSet<String> {
        self.leaves()
            .map(|(_, message)| message.topic.clone())
            .filter(|topic| !topic.is_empty())
            .collect()
    }
}
