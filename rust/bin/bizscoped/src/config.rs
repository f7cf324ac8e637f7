//! Server-side configuration.
//!
//! Reads `/etc/bizscope/<context>.toml` or an explicit path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory searched for context names.
const CONFIG_DIR: &str = "/etc/bizscope";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the database and policy files.
    #[serde(default)]
    pub data_dir: String,

    /// Explicit SQLite path; defaults to `{data_dir}/data.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessSection {
    /// Subordinate cache TTL in seconds.
    #[serde(default = "default_cache_ttl")]
    pub hierarchy_cache_ttl: u64,

    /// Resource policy table; defaults to `{data_dir}/access.toml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_path: Option<PathBuf>,
}

fn default_cache_ttl() -> u64 {
    120
}

impl Default for AccessSection {
    fn default() -> Self {
        Self {
            hierarchy_cache_ttl: default_cache_ttl(),
            policy_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub access: AccessSection,
}

impl ServerConfig {
    /// A context name maps to `/etc/bizscope/<name>.toml`; anything that
    /// looks like a path is used as is.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// The core service configuration derived from this file.
    pub fn service_config(&self, listen: &str) -> bizscope_core::ServiceConfig {
        bizscope_core::ServiceConfig {
            data_dir: Some(PathBuf::from(&self.storage.data_dir)),
            sqlite_path: self.storage.sqlite_path.clone(),
            policy_path: self.access.policy_path.clone(),
            listen: listen.to_string(),
        }
    }
}
