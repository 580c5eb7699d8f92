//! Upstream forwarding.
//!
//! # Responsibilities
//! - Send the matched request to its upstream with the rewritten URI
//! - Stream the request body up and the response body back
//! - Pick a verifying or non-verifying TLS client per rule
//!
//! # Design Decisions
//! - The upstream URI is sent as built, with no path normalization
//! - Redirects are relayed to the client, never followed
//! - Bodies are relayed byte for byte (no decompression)
//! - No headers are added beyond the Host rewrite
//! - Dropping the returned future aborts the upstream request
//! - No retries

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Version};
use axum::response::Response;
use hyper::body::Incoming;
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::proxy::headers::{end_to_end_headers, has_body, upstream_request_headers};
use crate::proxy::ProxyError;
use crate::routing::{RouteMatch, RouteRule};

type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Shared upstream HTTP clients.
///
/// Cloning is cheap; the underlying connection pools are shared.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    insecure_client: Option<UpstreamClient>,
    upstream_timeout: Option<Duration>,
}

impl Forwarder {
    /// Build the clients. The non-verifying one only exists when some rule
    /// needs it.
    pub fn new(timeouts: &TimeoutConfig, needs_insecure: bool) -> Result<Self, native_tls::Error> {
        let client = build_client(timeouts, true)?;
        let insecure_client = if needs_insecure {
            Some(build_client(timeouts, false)?)
        } else {
            None
        };

        Ok(Self {
            client,
            insecure_client,
            upstream_timeout: timeouts.upstream_secs.map(Duration::from_secs),
        })
    }

    fn client_for(&self, rule: &RouteRule) -> &UpstreamClient {
        match &self.insecure_client {
            Some(insecure) if !rule.verify_tls() => insecure,
            _ => &self.client,
        }
    }

    /// Forward `request` to the upstream selected by `route` and relay the
    /// response.
    pub async fn forward(
        &self,
        route: &RouteMatch<'_>,
        request: Request<Body>,
    ) -> Result<Response, ProxyError> {
        let (mut parts, body) = request.into_parts();
        let upstream = route.rule.upstream().authority();

        let body = if has_body(&parts.headers) {
            body
        } else {
            Body::empty()
        };
        parts.headers = upstream_request_headers(&parts.headers, route.rule);
        parts.uri = route.upstream_uri()?;
        parts.version = Version::HTTP_11;

        let pending = self
            .client_for(route.rule)
            .request(Request::from_parts(parts, body));

        let result = match self.upstream_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| ProxyError::Timeout {
                    upstream: upstream.to_string(),
                })?,
            None => pending.await,
        };
        let response = result.map_err(|e| ProxyError::from_client(upstream, e))?;

        relay(response)
    }
}

fn build_client(timeouts: &TimeoutConfig, verify_tls: bool) -> Result<UpstreamClient, native_tls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

    let tls = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(!verify_tls)
        .danger_accept_invalid_hostnames(!verify_tls)
        .build()?;
    let https = HttpsConnector::from((http, tokio_native_tls::TlsConnector::from(tls)));

    Ok(Client::builder(TokioExecutor::new()).build(https))
}

fn relay(upstream: hyper::Response<Incoming>) -> Result<Response, ProxyError> {
    let (parts, body) = upstream.into_parts();
    let mut builder = Response::builder().status(parts.status);
    if let Some(headers) = builder.headers_mut() {
        *headers = end_to_end_headers(&parts.headers);
    }

    Ok(builder.body(Body::new(body))?)
}
