//! pos-offline-gateway server entry point.
//!
//! Starts the Axum HTTP server with the offline log and service worker
//! endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pos_offline_gateway::api;
use pos_offline_gateway::app_state::AppState;
use pos_offline_gateway::config::{GatewayConfig, LogFormat, StorageBackend};
use pos_offline_gateway::persistence::{
    IdentityDirectory, LogStore, MemoryStore, PostgresStore,
};
use pos_offline_gateway::service::OfflineLogService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config =
        GatewayConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        "starting pos-offline-gateway"
    );

    // Build persistence layer
    let (store, directory): (Arc<dyn LogStore>, Arc<dyn IdentityDirectory>) =
        match config.storage_backend {
            StorageBackend::Postgres => {
                let pg = Arc::new(
                    PostgresStore::connect(&config)
                        .await
                        .context("connecting to PostgreSQL")?,
                );
                (
                    Arc::clone(&pg) as Arc<dyn LogStore>,
                    pg as Arc<dyn IdentityDirectory>,
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage; offline logs are lost on restart");
                let mem = Arc::new(MemoryStore::new());
                if let Some(token) = config.demo_operator_token.as_deref() {
                    mem.seed_demo_operator(token).await.context("seeding demo operator")?;
                    tracing::info!("seeded demo operator (user 1, session 1)");
                }
                (
                    Arc::clone(&mem) as Arc<dyn LogStore>,
                    mem as Arc<dyn IdentityDirectory>,
                )
            }
        };

    // Build application state
    let app_state = AppState {
        log_service: Arc::new(OfflineLogService::new(store)),
        directory,
        static_dir: Arc::new(config.static_dir.clone()),
    };

    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
