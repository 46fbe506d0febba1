mod api;
mod catalog;
mod config;
mod errors;
mod models;
mod store;
mod templates;

use crate::api::{ApiServer, AppState};
use crate::catalog::DataGovCatalog;
use crate::config::Config;
use crate::store::{CatalogDb, StoreHandle};
use crate::templates::TemplateStore;
use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    // ── 1. Initializing: any failure here exits non-zero ───────────
    let templates = TemplateStore::load(&config.template_dir)?;

    let db = CatalogDb::open(&config.database_path)
        .with_context(|| format!("failed to open database at {}", config.database_path))?;
    let store = StoreHandle::spawn(db);
    let stored = store.count().await.context("failed to query record count")?;

    let catalog = DataGovCatalog::new(&config.catalog_url, config.fetch_timeout)
        .context("failed to build catalog client")?;

    tracing::info!(
        "catalogd starting — upstream {} | {} record(s) on disk | port {}",
        config.catalog_url,
        stored,
        config.port
    );

    let state = AppState {
        catalog: Arc::new(catalog),
        store: store.clone(),
        templates: Arc::new(templates),
        request_timeout: config.request_timeout,
    };

    let server = ApiServer::bind(state, config.port)
        .await
        .context("failed to bind HTTP listener")?;

    // ── 2. Running: listener on its own task, main blocks on signals ──
    let cancel = CancellationToken::new();
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(server_cancel).await {
            tracing::error!("server error: {e}");
        }
    });

    shutdown_signal().await;
    tracing::info!("shutdown signal received");

    // ── 3. ShuttingDown: stop accepting, drain within the grace bound ──
    cancel.cancel();
    if tokio::time::timeout(config.shutdown_grace, server_handle)
        .await
        .is_err()
    {
        tracing::error!(
            "listener did not stop within {:?}, exiting anyway",
            config.shutdown_grace
        );
    }

    // ── 4. Stopped ─────────────────────────────────────────────────
    if let Err(e) = store.close().await {
        tracing::error!("failed to close store: {e}");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolves when SIGINT (ctrl-c) or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
