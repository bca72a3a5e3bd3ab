//! Startup orchestration.
//!
//! Order: metrics → credential store → TLS material → listener. Any error is
//! fatal and returned to `main`; traffic is accepted only once everything
//! before the listener is ready.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{prepare_tls, TlsError};
use crate::observability::metrics;
use crate::store::{CredentialStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("credential store: {0}")]
    Store(#[from] StoreError),

    #[error("TLS: {0}")]
    Tls(#[from] TlsError),

    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bring the service up and serve until `shutdown` fires.
pub async fn run(config: ServiceConfig, rebuild: bool, shutdown: &Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dataset = config.dataset.clone();
    let store =
        tokio::task::spawn_blocking(move || CredentialStore::ensure(&dataset, rebuild))
            .await
            .map_err(StoreError::from)??;

    let bind_address = config.server.bind_address();
    let rate_limit = &config.rate_limit;
    tracing::info!(
        bind_address = %bind_address,
        tls = config.tls.enabled,
        rate_limit_enabled = rate_limit.enabled,
        max_requests = rate_limit.max_requests,
        window_secs = rate_limit.window_secs,
        database = %store.path().display(),
        "Configuration loaded"
    );

    if config.tls.enabled {
        let tls = prepare_tls(&config.tls).await?;
        let addr = resolve(&bind_address).await?;
        HttpServer::new(config, store)
            .run_tls(addr, tls, shutdown.subscribe())
            .await?;
    } else {
        let listener = TcpListener::bind(&bind_address).await?;
        HttpServer::new(config, store)
            .run(listener, shutdown.subscribe())
            .await?;
    }

    Ok(())
}

async fn resolve(bind_address: &str) -> Result<SocketAddr, StartupError> {
    tokio::net::lookup_host(bind_address)
        .await?
        .next()
        .ok_or_else(|| StartupError::BindAddress(bind_address.to_string()))
}
