//! Docmint Server - Main entry point

use anyhow::{Context, Result};
use docmint_common::logging::{init_logging, LogConfig};
use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{signal, sync::Notify};
use tracing::{info, warn};

use docmint_server::{
    api,
    clients::{MergeClient, RenderClient},
    config::Config,
    db,
    features::FeatureState,
    storage::{config::StorageConfig, Storage},
    templates::PgTemplateStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("docmint-server")
        .filter_directives("docmint_server=debug,tower_http=debug,sqlx=info")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Docmint Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    // Requests are only served once the pool is connected and migrated.
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    let storage_config = StorageConfig::from_env()?;
    let storage = Storage::new(storage_config).await?;
    storage.ensure_bucket().await?;

    let renderer =
        RenderClient::new(config.render.clone()).context("Failed to build render client")?;
    let merger = MergeClient::new(config.merge.clone()).context("Failed to build merge client")?;
    info!("Document service clients initialized");

    let state = FeatureState {
        store: Arc::new(PgTemplateStore::new(db_pool, storage)),
        renderer: Arc::new(renderer),
        merger: Arc::new(merger),
    };

    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let draining = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let draining = Arc::clone(&draining);
            async move {
                shutdown_signal().await;
                draining.notify_one();
            }
        })
        .into_future();

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    tokio::select! {
        result = server => {
            result?;
            info!("Server shut down gracefully");
        },
        _ = async { draining.notified().await; tokio::time::sleep(grace).await } => {
            warn!("Connections still open after {} seconds, exiting", grace.as_secs());
        },
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
