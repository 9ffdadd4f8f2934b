use anyhow::Result;
use std::{io::ErrorKind, path::Path};
use tokio::{fs, net::TcpListener};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod views;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        "Starting event-media on {} (backend {:?}, container {}, static dir {})",
        cfg.addr(),
        cfg.backend,
        cfg.container,
        cfg.static_dir
    );

    // --- Ensure static directory exists ---
    if !Path::new(&cfg.static_dir).exists() {
        fs::create_dir_all(&cfg.static_dir).await?;
        tracing::info!("Created static directory at {}", cfg.static_dir);
    }

    // --- Initialize core services ---
    let storage = services::storage_service::StorageService::from_config(&cfg)?;
    let addr = cfg.addr();
    let (host, port) = (cfg.host.clone(), cfg.port);
    let state = state::AppState::new(cfg, storage);

    // --- Build router ---
    let app = routes::routes::app(state);

    // --- Start server ---
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
