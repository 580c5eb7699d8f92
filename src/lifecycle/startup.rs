//! Startup orchestration.
//!
//! # Responsibilities
//! - Name every way startup can fail
//! - Bind the listener from configuration
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds before the server is built, so a port conflict
//!   is reported before any upstream client exists

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, ListenerConfig};
use crate::routing::RouteError;

/// Fatal error while starting the dev server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to compile proxy rules: {0}")]
    Routes(#[from] RouteError),

    #[error("failed to build upstream TLS connector: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind the configured listen address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let bind_error = |source| StartupError::Bind {
        address: config.bind_address.clone(),
        source,
    };

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        bind_error(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;
    let listener = TcpListener::bind(addr).await.map_err(bind_error)?;

    tracing::info!(
        address = %listener.local_addr().map_err(bind_error)?,
        "Listener bound"
    );

    Ok(listener)
}
