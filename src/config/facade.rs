//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::FstreeConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and the environment.
    pub fn load() -> Result<FstreeConfig, ConfigError> {
        MergeService::load(None)
    }

    /// Load configuration with `path` layered over the global file.
    pub fn load_from_file(path: &Path) -> Result<FstreeConfig, ConfigError> {
        MergeService::load(Some(path))
    }

    /// Create default configuration.
    pub fn default() -> FstreeConfig {
        FstreeConfig::default()
    }
}
