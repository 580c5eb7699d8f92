//! Static file serving for requests no proxy rule claims.
//!
//! Serves a directory from disk with index support and an optional SPA
//! fallback to `index.html`.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::StaticFilesConfig;

/// Directory-backed asset fallback.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
    spa_fallback: bool,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>, spa_fallback: bool) -> Self {
        Self {
            root: root.into(),
            spa_fallback,
        }
    }

    /// `None` when no static root is configured.
    pub fn from_config(config: &StaticFilesConfig) -> Option<Self> {
        config
            .root
            .as_ref()
            .map(|root| Self::new(root, config.spa_fallback))
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Serve `request` from the static root.
    pub async fn serve(&self, request: Request<Body>) -> Response {
        let result = if self.spa_fallback {
            let index = ServeFile::new(self.root.join("index.html"));
            ServeDir::new(&self.root)
                .fallback(index)
                .oneshot(request)
                .await
                .map(IntoResponse::into_response)
        } else {
            ServeDir::new(&self.root)
                .oneshot(request)
                .await
                .map(IntoResponse::into_response)
        };

        match result {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

/// Response for unmatched requests when there is no static root.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}
