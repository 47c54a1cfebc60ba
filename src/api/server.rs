//! HTTP server startup and graceful shutdown.

use std::io;

use axum::Router;
use log::{error, info, warn};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServerConfig;

/// Errors raised while running the server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Server encountered an error: {0}")]
    Runtime(#[from] io::Error),
}

/// Resolves when the process receives Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight requests");
}

/// Binds to the configured address and serves `app` until shutdown.
pub async fn serve(app: Router, config: &ServerConfig) -> Result<(), ServerError> {
    let addr = config.server_addr();

    let listener = TcpListener::bind(addr).await.map_err(|source| {
        error!("Failed to bind to {}: {}", addr, source);
        ServerError::Bind {
            address: addr.to_string(),
            source,
        }
    })?;

    info!("Listening on http://{}", addr);
    if config.binds_to_all_interfaces() {
        warn!("Server is bound to all interfaces. Ensure firewall rules are properly configured.");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}
