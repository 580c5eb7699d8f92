//! Upstream failure taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::Error as ClientError;
use thiserror::Error;

/// Failure while forwarding a request to its upstream.
///
/// Every variant is surfaced to the calling request only.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connection refused, DNS failure, connect timeout, TLS handshake failure.
    #[error("upstream {upstream} unreachable: {source}")]
    Unreachable {
        upstream: String,
        #[source]
        source: ClientError,
    },

    /// The configured upstream timeout elapsed before the response head.
    #[error("upstream {upstream} timed out")]
    Timeout { upstream: String },

    /// The upstream connection broke mid-exchange.
    #[error("upstream {upstream} failed: {source}")]
    Upstream {
        upstream: String,
        #[source]
        source: ClientError,
    },

    /// The upstream request or response could not be built.
    #[error("invalid upstream message: {0}")]
    Message(#[from] axum::http::Error),
}

impl ProxyError {
    /// Classify a client error against the upstream it was sent to.
    ///
    /// Anything that failed while connecting is `Unreachable`, including a
    /// connect timeout.
    pub fn from_client(upstream: &str, source: ClientError) -> Self {
        let upstream = upstream.to_string();
        if source.is_connect() {
            ProxyError::Unreachable { upstream, source }
        } else {
            ProxyError::Upstream { upstream, source }
        }
    }

    /// Status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match &self {
            ProxyError::Timeout { .. } => "Upstream request timed out",
            ProxyError::Unreachable { .. } => "Upstream unreachable",
            _ => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}
