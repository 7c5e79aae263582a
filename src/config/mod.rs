//! Configuration for the lifecycle engine.
//!
//! Configured via a TOML file; every section is optional with defaults, so
//! an empty file is a valid single-tenant configuration.
//!
//! # Example
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [database]
//! type = "sqlite"
//! path = "post-lifetime.db"
//!
//! [job]
//! lock_duration_secs = 300
//! poll_interval_secs = 60
//! tenants = ["default"]
//!
//! [site]
//! admin_email = "admin@example.com"
//! edit_url = "/admin/items/{id}/edit"
//! ```

mod database;
mod job;
mod logging;
mod site;

use std::path::Path;

pub use database::*;
pub use job::*;
pub use logging::*;
use serde::{Deserialize, Serialize};
pub use site::*;
use thiserror::Error;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifetimeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub job: JobConfig,

    #[serde(default)]
    pub site: SiteConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl LifetimeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
