//! Atelier Server — Application entry point.

use atelier_auth::HttpIdentityBackend;
use atelier_db::DbManager;
use atelier_server::{AppState, ServerConfig, router};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "atelier.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("atelier=info,tower_http=info")),
        )
        .json()
        .init();

    let config_path =
        std::env::var("ATELIER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ServerConfig::load(&config_path)?;
    tracing::info!(config = %config_path, "Starting Atelier server...");

    if config.auth.legacy_roles.is_empty() {
        tracing::info!("Legacy role allowlist is empty");
    } else {
        tracing::warn!("Legacy role allowlist is configured; roles may be promoted from it");
    }

    let db = DbManager::connect(&config.database).await?;
    atelier_db::run_migrations(db.client()).await?;

    let backend = HttpIdentityBackend::new(&config.identity_backend)?;
    let state = AppState::new(db.client().clone(), backend, &config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Atelier server stopped.");
    Ok(())
}
