//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use dev_proxy::config::ProxyRuleConfig;
use dev_proxy::lifecycle::startup;
use dev_proxy::{DevServerConfig, HttpServer, Shutdown};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    pub host: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

/// A mock backend that records every request it receives.
///
/// Special paths: `/redirect` answers 302, `/slow` answers after 3 seconds.
#[derive(Clone)]
pub struct MockUpstream {
    pub name: &'static str,
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn authority(&self) -> String {
        self.addr.to_string()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a recording mock upstream on an ephemeral port.
pub async fn start_upstream(name: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream = MockUpstream {
        name,
        addr: listener.local_addr().unwrap(),
        requests: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .fallback(record)
        .with_state(upstream.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    upstream
}

async fn record(State(upstream): State<MockUpstream>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        host: parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        headers: parts.headers.clone(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    upstream.requests.lock().unwrap().push(recorded.clone());

    match parts.uri.path() {
        "/redirect" => (StatusCode::FOUND, [(header::LOCATION, "/elsewhere")]).into_response(),
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "late".into_response()
        }
        _ => (
            [("x-upstream", upstream.name)],
            Json(json!({
                "upstream": upstream.name,
                "method": recorded.method,
                "uri": recorded.uri,
                "body": recorded.body,
            })),
        )
            .into_response(),
    }
}

/// A rule shaped like the built-in API rules, pointing at `target`.
pub fn api_rule(path: &str, target: &str) -> ProxyRuleConfig {
    ProxyRuleConfig {
        path: path.to_string(),
        target: target.to_string(),
        change_origin: true,
        strip_prefix: true,
        secure: false,
    }
}

/// The built-in table with both upstreams replaced by mocks.
pub fn api_config(golang: &MockUpstream, node: &MockUpstream) -> DevServerConfig {
    DevServerConfig {
        proxy: vec![
            api_rule("/api/golang", &golang.origin()),
            api_rule("/api/node", &node.origin()),
        ],
        ..DevServerConfig::default()
    }
}

/// Start the dev server on an ephemeral port.
pub async fn start_proxy(mut config: DevServerConfig) -> (SocketAddr, Shutdown) {
    config.listener.bind_address = "127.0.0.1:0".to_string();

    let listener = startup::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Test client: no system proxy, redirects not followed.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Send a hand-written GET so the request target reaches the proxy exactly
/// as typed. Returns the raw response.
pub async fn raw_get(proxy: SocketAddr, target: &str) -> String {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target, proxy
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}
