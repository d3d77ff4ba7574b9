// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Medrelay: per-user WebSocket relay for booking notifications.

pub mod config;
pub mod error;
pub mod registry;
pub mod state;
pub mod test_support;
pub mod transport;
pub mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::state::Relay;
use crate::transport::build_router;

/// Run the relay server until shutdown.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    // Needed for `wss://` upstreams. Fails only if already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let addr = format!("{}:{}", config.host, config.port);
    let relay = Arc::new(Relay::new(config, CancellationToken::new()));

    {
        let relay = Arc::clone(&relay);
        tokio::spawn(async move {
            shutdown_signal().await;
            relay.shutdown().await;
        });
    }

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(backend = %relay.config.backend_url, "medrelay listening on {addr}");
    let shutdown = relay.shutdown.clone();
    axum::serve(listener, build_router(relay)).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}

/// Serve `relay` on an already-bound listener in a background task.
pub fn spawn_server(
    relay: Arc<Relay>,
    listener: TcpListener,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let addr = listener.local_addr()?;
    let shutdown = relay.shutdown.clone();
    let router = build_router(relay);
    let handle = tokio::spawn(async move {
        if let Err(e) =
            axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await
        {
            tracing::error!(err = %e, "relay server failed");
        }
    });
    Ok((addr, handle))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(err = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(err = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
