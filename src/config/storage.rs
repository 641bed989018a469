//! StorageConfig: where the profile tree lives on disk.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const PROFILES_DIR: &str = "profiles";

fn default_application() -> String {
    "fstree".to_string()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Config directory holding `profiles/`. None means the platform default
    /// for `application`.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,

    /// Application name used to derive platform directories.
    #[serde(default = "default_application")]
    pub application: String,
}

impl StorageConfig {
    /// Resolve the config directory, explicit first, then `ProjectDirs`.
    pub fn resolve_config_dir(&self) -> Result<PathBuf, ApiError> {
        if let Some(dir) = &self.config_dir {
            if !dir.as_os_str().is_empty() {
                return Ok(dir.clone());
            }
        }
        let project_dirs = directories::ProjectDirs::from("", "", &self.application)
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "Could not determine config directory for '{}'",
                    self.application
                ))
            })?;
        Ok(project_dirs.config_dir().to_path_buf())
    }

    /// Base directory of the profile tree.
    pub fn profiles_dir(&self) -> Result<PathBuf, ApiError> {
        Ok(self.resolve_config_dir()?.join(PROFILES_DIR))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            config_dir: None,
            application: default_application(),
        }
    }
}
