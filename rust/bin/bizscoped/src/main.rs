//! `bizscoped`: the access scope server.
//!
//! Usage:
//!   bizscoped -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/bizscope/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use access::service::AccessConfig;
use access::AccessModule;
use bizscope_core::{Authenticator, Module, TrustedHeaders};
use bizscope_sql::{SQLStore, SqliteStore};

use config::ServerConfig;

/// Access scope server.
#[derive(Parser, Debug)]
#[command(name = "bizscoped", about = "Row-level access scope server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    let core_config = server_config.service_config(&cli.listen);
    if let Some(data_dir) = &core_config.data_dir {
        std::fs::create_dir_all(data_dir)?;
    }

    // Policy table first: a bad table must stop startup before anything opens.
    let registry = bootstrap::load_registry(&core_config.resolve_policy_path())?;

    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let authenticator: Arc<dyn Authenticator> = Arc::new(TrustedHeaders);
    let access_config = AccessConfig {
        hierarchy_cache_ttl: server_config.access.hierarchy_cache_ttl,
    };
    let access_module = AccessModule::new(sql, registry, access_config, authenticator)?;
    info!(
        "Access module initialized with {} resource types",
        access_module.service().registry().len()
    );

    let app = routes::build_router(vec![(access_module.mount_path(), access_module.routes())]);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("bizscoped listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
