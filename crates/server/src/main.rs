use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ledgerline_import::Importer;
use ledgerline_storage::SqliteLedger;

mod config;
mod routes;

use config::ServerConfig;
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var_os("LEDGERLINE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ledgerline.toml"));
    let config = ServerConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let pool = ledgerline_storage::create_db(&config.database_path)
        .await
        .with_context(|| format!("opening database {}", config.database_path.display()))?;

    let state = AppState {
        importer: Arc::new(Importer::new(SqliteLedger::new(pool))),
        dedupe_defaults: config.dedupe_defaults(),
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
