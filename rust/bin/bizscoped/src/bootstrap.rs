//! Startup checks.
//!
//! When bizscoped starts:
//! 1. Verify the config names a data directory.
//! 2. Load and validate the resource policy table. A bad table stops the
//!    server; it never starts with a partial table.

use std::path::Path;

use access::service::registry::ResourceRegistry;
use tracing::{error, info};

use crate::config::ServerConfig;

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    Ok(())
}

/// Load the resource policy table from `path`, or the built-in table if the
/// file does not exist.
pub fn load_registry(path: &Path) -> anyhow::Result<ResourceRegistry> {
    let registry = ResourceRegistry::load(path).map_err(|e| {
        error!("resource policy table {} rejected: {}", path.display(), e);
        anyhow::anyhow!("invalid resource policy table {}: {}", path.display(), e)
    })?;
    for policy in registry.iter() {
        info!(
            resource = %policy.prefix,
            view_default = %policy.view_default,
            owner_column = policy.default_owner_column(),
            mutation_default = %policy.mutation_default,
            "resource registered"
        );
    }
    Ok(registry)
}
