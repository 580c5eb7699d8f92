//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dev server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the dev server.
///
/// The `Default` value reproduces the built-in proxy table, so a config file
/// that omits `[[proxy]]` keeps the two API rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Static asset fallback for requests no proxy rule matches.
    pub static_files: StaticFilesConfig,

    /// Ordered proxy rules. First match wins.
    pub proxy: Vec<ProxyRuleConfig>,

    /// Timeout configuration for upstream calls.
    pub timeouts: TimeoutConfig,

    /// Upstream TLS policy.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            static_files: StaticFilesConfig::default(),
            proxy: default_proxy_rules(),
            timeouts: TimeoutConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// The API rules the front-end dev server ships with.
pub fn default_proxy_rules() -> Vec<ProxyRuleConfig> {
    vec![
        ProxyRuleConfig {
            path: "/api/golang".to_string(),
            target: "http://localhost:8080".to_string(),
            change_origin: true,
            strip_prefix: true,
            secure: false,
        },
        ProxyRuleConfig {
            path: "/api/node".to_string(),
            target: "http://localhost:3000".to_string(),
            change_origin: true,
            strip_prefix: true,
            secure: false,
        },
    ]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5173").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5173".to_string(),
        }
    }
}

/// Static asset serving for unproxied requests.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory to serve. Unmatched requests get 404 when unset.
    pub root: Option<PathBuf>,

    /// Serve `root/index.html` for paths that don't exist on disk.
    pub spa_fallback: bool,
}

/// A single proxy rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyRuleConfig {
    /// Path prefix to match. A leading `^` makes it a regular expression.
    pub path: String,

    /// Upstream origin (e.g., "http://localhost:8080").
    pub target: String,

    /// Rewrite the outbound Host header to the upstream's authority.
    #[serde(default)]
    pub change_origin: bool,

    /// Remove the matched prefix before forwarding.
    #[serde(default)]
    pub strip_prefix: bool,

    /// Verify the upstream's TLS certificate.
    #[serde(default = "default_secure")]
    pub secure: bool,
}

fn default_secure() -> bool {
    true
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total upstream request timeout in seconds. No limit when unset.
    pub upstream_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            upstream_secs: None,
        }
    }
}

/// Upstream TLS policy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Permit rules with `secure = false` to skip certificate verification.
    /// Local development only.
    pub allow_insecure_upstreams: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
