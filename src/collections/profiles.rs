//! Connection profiles
//!
//! A profile leaf is a directory holding `broker-options.json` and
//! `client-options.json`. The directory also hosts the profile's own
//! `messages/` tree, which travels with the profile on rename and move.
//!
//! The QuickConnect profile backs ad-hoc connections. It is stored next to
//! the top-level profiles under `QuickConnect/` but is never part of the
//! ordered tree.

use crate::adapter::{EntryInfo, LeafAdapter};
use crate::collections::extract;
use crate::collections::messages::{MessageAdapter, MessageTree};
use crate::encoding;
use crate::error::TreeError;
use crate::tree::TreeStore;
use crate::types::{DisplayValue, Handle, Icon};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const BROKER_OPTIONS_FILE: &str = "broker-options.json";
pub const CLIENT_OPTIONS_FILE: &str = "client-options.json";
pub const MESSAGES_DIR: &str = "messages";
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Name of the profile used for ad-hoc connections.
pub const QUICK_CONNECT_NAME: &str = "QuickConnect";

/// Default name of profiles created through [`ProfileTree::create_profile`].
pub const NEW_PROFILE_NAME: &str = "New profile";

/// Connection settings of one broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerOptions {
    pub auto_reconnect: bool,
    pub max_reconnect_retries: u32,
    pub client_id: String,
    /// Seconds.
    pub connect_timeout: u32,
    /// Seconds.
    pub disconnect_timeout: u32,
    pub hostname: String,
    /// Seconds.
    pub keep_alive_interval: u32,
    pub max_in_flight: u32,
    pub password: String,
    pub port: u16,
    pub username: String,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: false,
            max_reconnect_retries: 10,
            client_id: String::new(),
            connect_timeout: 5,
            disconnect_timeout: 5,
            hostname: "localhost".to_string(),
            keep_alive_interval: 60,
            max_in_flight: 10,
            password: String::new(),
            port: DEFAULT_MQTT_PORT,
            username: String::new(),
        }
    }
}

impl BrokerOptions {
    /// Read options from JSON; missing or mistyped fields keep their default.
    pub fn from_json(data: &Value) -> Self {
        let d = Self::default();
        Self {
            auto_reconnect: extract(data, "autoReconnect").unwrap_or(d.auto_reconnect),
            max_reconnect_retries: extract(data, "maxReconnectRetries")
                .unwrap_or(d.max_reconnect_retries),
            client_id: extract(data, "clientId").unwrap_or(d.client_id),
            connect_timeout: extract(data, "connectTimeout").unwrap_or(d.connect_timeout),
            disconnect_timeout: extract(data, "disconnectTimeout")
                .unwrap_or(d.disconnect_timeout),
            hostname: extract(data, "hostname").unwrap_or(d.hostname),
            keep_alive_interval: extract(data, "keepAliveInterval")
                .unwrap_or(d.keep_alive_interval),
            max_in_flight: extract(data, "maxInFlight").unwrap_or(d.max_in_flight),
            password: extract(data, "password").unwrap_or(d.password),
            port: extract(data, "port").unwrap_or(d.port),
            username: extract(data, "username").unwrap_or(d.username),
        }
    }

    /// `host:port` as shown in the URL column.
    pub fn url(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Split a `host:port` string as typed into the quick connect bar.
///
/// The port falls back to [`DEFAULT_MQTT_PORT`] unless the input has exactly
/// one colon followed by a number that fits a port. An empty host becomes
/// `localhost`.
pub fn parse_quick_connect_url(url: &str) -> (String, u16) {
    let parts: Vec<&str> = url.trim().split(':').collect();
    let port = match parts.as_slice() {
        [_, port] if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            port.parse().unwrap_or(DEFAULT_MQTT_PORT)
        }
        _ => DEFAULT_MQTT_PORT,
    };
    let hostname = match parts.first() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => "localhost".to_string(),
    };
    (hostname, port)
}

/// Per-profile settings of the client window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientOptions {
    pub layout: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            layout: "Default".to_string(),
        }
    }
}

impl ClientOptions {
    pub fn from_json(data: &Value) -> Self {
        Self {
            layout: extract(data, "layout").unwrap_or_else(|| Self::default().layout),
        }
    }
}

/// Payload of a profile leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub broker: BrokerOptions,
    pub client: ClientOptions,
}

/// Adapter for the profile tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileAdapter;

/// Column layout of the profile tree.
pub mod column {
    pub const NAME: usize = 0;
    pub const URL: usize = 1;
}

fn read_json(path: &Path) -> Option<Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not open '{}': {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Could not parse '{}': {}", path.display(), e);
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TreeError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| TreeError::Payload(e.to_string()))?;
    fs::write(path, json).map_err(|e| TreeError::io(path, e))
}

impl LeafAdapter for ProfileAdapter {
    type Payload = Profile;

    fn is_leaf(&self, entry: &EntryInfo<'_>) -> bool {
        entry.is_dir && entry.path.join(CLIENT_OPTIONS_FILE).is_file()
    }

    fn load_leaf(&self, path: &Path) -> Result<Profile, TreeError> {
        let broker = read_json(&path.join(BROKER_OPTIONS_FILE))
            .map(|data| BrokerOptions::from_json(&data))
            .unwrap_or_default();
        let client = read_json(&path.join(CLIENT_OPTIONS_FILE))
            .map(|data| ClientOptions::from_json(&data))
            .unwrap_or_default();
        Ok(Profile { broker, client })
    }

    fn is_reserved_root_entry(&self, file_name: &str) -> bool {
        file_name == encoding::encode(QUICK_CONNECT_NAME)
    }

    /// `client-options.json` marks the directory as a profile, so it is
    /// written first. A directory created here is removed again if a write
    /// fails.
    fn save_leaf(&self, path: &Path, payload: &Profile) -> Result<(), TreeError> {
        if path.exists() && !path.is_dir() {
            warn!("Replacing file {} with a profile directory", path.display());
            fs::remove_file(path).map_err(|e| TreeError::io(path, e))?;
        }
        let created = !path.exists();
        fs::create_dir_all(path).map_err(|e| TreeError::io(path, e))?;
        let result = write_json(&path.join(CLIENT_OPTIONS_FILE), &payload.client)
            .and_then(|()| write_json(&path.join(BROKER_OPTIONS_FILE), &payload.broker));
        if result.is_err() && created {
            if let Err(e) = fs::remove_dir_all(path) {
                warn!("Could not clean up {}: {}", path.display(), e);
            }
        }
        result
    }

    fn column_count(&self) -> usize {
        2
    }

    fn render_column(&self, name: &str, payload: &Profile, column: usize) -> DisplayValue {
        match column {
            column::NAME => DisplayValue::with_icon(name, Icon::Profile),
            column::URL => DisplayValue::text(payload.broker.url()),
            _ => DisplayValue::default(),
        }
    }
}

/// Tree of connection profiles.
pub type ProfileTree = TreeStore<ProfileAdapter>;

impl TreeStore<ProfileAdapter> {
    /// Create a profile with default options named "New profile"
    /// (uniquified) under `parent`.
    pub fn create_profile(&mut self, parent: Handle) -> Result<Handle, TreeError> {
        self.leaf_create(parent, Profile::default(), NEW_PROFILE_NAME)
    }

    pub fn broker_options(&self, handle: Handle) -> Result<&BrokerOptions, TreeError> {
        Ok(&self.leaf_payload(handle)?.broker)
    }

    pub fn client_options(&self, handle: Handle) -> Result<&ClientOptions, TreeError> {
        Ok(&self.leaf_payload(handle)?.client)
    }

    pub fn update_broker_options(
        &mut self,
        handle: Handle,
        options: BrokerOptions,
    ) -> Result<(), TreeError> {
        self.update_leaf(handle, move |profile| profile.broker = options)
    }

    pub fn update_client_options(
        &mut self,
        handle: Handle,
        options: ClientOptions,
    ) -> Result<(), TreeError> {
        self.update_leaf(handle, move |profile| profile.client = options)
    }

    /// Base directory of the saved messages that belong to a profile.
    pub fn messages_dir(&self, handle: Handle) -> Result<PathBuf, TreeError> {
        self.leaf_payload(handle)?;
        Ok(self.path_of(handle)?.join(MESSAGES_DIR))
    }

    /// Open the message tree of a profile, creating its directory if needed.
    pub fn open_messages(&self, handle: Handle) -> Result<MessageTree, TreeError> {
        MessageTree::open(self.messages_dir(handle)?, MessageAdapter)
    }

    pub fn quick_connect_dir(&self) -> PathBuf {
        self.base_dir().join(encoding::encode(QUICK_CONNECT_NAME))
    }

    /// Read the QuickConnect profile, writing one with default options the
    /// first time.
    pub fn quick_connect(&self) -> Result<Profile, TreeError> {
        let dir = self.quick_connect_dir();
        let entry = EntryInfo {
            path: &dir,
            file_name: QUICK_CONNECT_NAME,
            is_dir: dir.is_dir(),
        };
        if ProfileAdapter.is_leaf(&entry) {
            return ProfileAdapter.load_leaf(&dir);
        }
        info!("Creating quick connect profile in {}", dir.display());
        let profile = Profile::default();
        ProfileAdapter.save_leaf(&dir, &profile)?;
        Ok(profile)
    }

    /// Point the QuickConnect profile at `url` (see
    /// [`parse_quick_connect_url`]) and save it. Other options are kept.
    pub fn update_quick_connect(&self, url: &str) -> Result<Profile, TreeError> {
        let mut profile = self.quick_connect()?;
        let (hostname, port) = parse_quick_connect_url(url);
        info!("Quick connect target set to {}:{}", hostname, port);
        profile.broker.hostname = hostname;
        profile.broker.port = port;
        ProfileAdapter.save_leaf(&self.quick_connect_dir(), &profile)?;
        Ok(profile)
    }

    /// Saved messages of the QuickConnect profile.
    pub fn quick_connect_messages(&self) -> Result<MessageTree, TreeError> {
        self.quick_connect()?;
        MessageTree::open(self.quick_connect_dir().join(MESSAGES_DIR), MessageAdapter)
    }
}
