//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the dev handler
//! - Wire up middleware (tracing, request ID)
//! - Dispatch requests to the routing table
//! - Forward matched requests, serve static assets otherwise

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::DevServerConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::static_files::{not_found, StaticAssets};
use crate::lifecycle::startup::StartupError;
use crate::proxy::Forwarder;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub forwarder: Forwarder,
    pub assets: Option<StaticAssets>,
}

/// The dev server: proxy rules in front of static asset serving.
pub struct HttpServer {
    router: Router,
    config: DevServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given (already validated) configuration.
    pub fn new(config: DevServerConfig) -> Result<Self, StartupError> {
        let routes = Arc::new(RouteTable::from_config(&config.proxy, &config.security)?);

        for rule in routes.rules() {
            tracing::info!(
                path = rule.pattern(),
                upstream = %rule.upstream().origin(),
                change_origin = rule.change_origin(),
                strip_prefix = rule.strip_prefix(),
                secure = rule.secure(),
                verify_tls = rule.verify_tls(),
                "Proxy rule registered"
            );
            if rule.upstream().is_tls() && !rule.verify_tls() {
                tracing::warn!(
                    upstream = %rule.upstream().origin(),
                    "Upstream certificate verification disabled, local development only"
                );
            }
        }

        let forwarder = Forwarder::new(&config.timeouts, routes.needs_insecure_client())?;
        let assets = StaticAssets::from_config(&config.static_files);
        if let Some(assets) = &assets {
            tracing::info!(root = ?assets.root(), "Serving static assets");
        }

        let state = AppState {
            routes,
            forwarder,
            assets,
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dev_handler)
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.config.proxy.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The configured application, for driving it without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Main dev handler.
/// Proxies requests matching a rule; everything else goes to static serving.
async fn dev_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(route) = state.routes.match_uri(request.uri()) else {
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "No proxy rule matched"
        );
        return match &state.assets {
            Some(assets) => assets.serve(request).await,
            None => not_found(),
        };
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        rule = route.rule.pattern(),
        upstream = %route.rule.upstream().origin(),
        forward_path = %route.forward_path,
        "Proxying request"
    );

    match state.forwarder.forward(&route, request).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                status = response.status().as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Upstream responded"
            );
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %route.rule.upstream().origin(),
                error = %e,
                "Upstream error"
            );
            e.into_response()
        }
    }
}
