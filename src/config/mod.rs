//! Configuration
//!
//! `FstreeConfig` is assembled by the `config` crate from built-in defaults,
//! the global config file, an optional explicit file and `FSTREE_*`
//! environment variables, in that order of increasing precedence.

mod facade;
pub mod storage;

pub mod merge {
    pub mod service;
}

pub mod paths {
    pub mod xdg_root;
}

pub mod sources {
    pub mod environment;
    pub mod global_file;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use storage::StorageConfig;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FstreeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}
