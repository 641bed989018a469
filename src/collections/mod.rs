//! Concrete collections
//!
//! The two trees the application persists: saved message snippets and
//! connection profiles. Each is a [`crate::tree::TreeStore`] specialized by
//! its own [`crate::adapter::LeafAdapter`].

pub mod messages;
pub mod profiles;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Read `key` from a JSON object, `None` when absent or of the wrong type.
pub(crate) fn extract<T: DeserializeOwned>(data: &Value, key: &str) -> Option<T> {
    data.get(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}
