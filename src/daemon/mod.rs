//! The galleryd daemon: services, HTTP API and process entry.

pub mod http;
pub mod metrics;
pub mod paths;
pub mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::config::GalleryConfig;

/// Time open connections get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Run the HTTP daemon until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the services cannot be prepared or the listener
/// cannot bind.
pub async fn run(config: GalleryConfig) -> Result<()> {
    let handle = match metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Metrics disabled");
            None
        },
    };

    let state = Arc::new(http::AppState::from_config(&config, handle)?);
    info!(
        output = %state.gallery.roots().root(services::gallery::SourceKind::Output).display(),
        input = %state.gallery.roots().root(services::gallery::SourceKind::Input).display(),
        thumbs = %state.thumbs.thumbs_dir().display(),
        "Media roots ready"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "galleryd listening");

    // Change streams never finish on their own, so graceful shutdown gets a
    // bounded drain period before the server future is dropped.
    let stopping = Arc::new(Notify::new());
    let server = axum::serve(listener, http::router(state)).with_graceful_shutdown({
        let stopping = Arc::clone(&stopping);
        async move {
            shutdown_signal().await;
            stopping.notify_one();
        }
    })
    .into_future();

    tokio::select! {
        result = server => result.context("HTTP server failed")?,
        () = async {
            stopping.notified().await;
            tokio::time::sleep(SHUTDOWN_GRACE).await;
        } => warn!(grace_secs = SHUTDOWN_GRACE.as_secs(), "Closing open connections"),
    }

    info!("galleryd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
