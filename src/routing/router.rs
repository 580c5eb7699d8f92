//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in configuration order
//! - Look up the first route matching a request path
//! - Compute the forwarded path and upstream URI
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in order; the first matching rule wins
//! - Explicit `None` on no match so callers fall through to static serving
//! - The forwarded path and query are copied verbatim, never normalized

use axum::http::uri::PathAndQuery;
use axum::http::{HeaderValue, Uri};
use url::Url;

use crate::config::{ProxyRuleConfig, SecurityConfig};
use crate::routing::matcher::{self, Matcher};
use crate::routing::rewrite::strip_prefix;
use crate::routing::RouteError;

/// The origin a rule forwards to.
#[derive(Debug, Clone)]
pub struct Upstream {
    origin: Url,
    authority: String,
    base_path: String,
    host_header: HeaderValue,
}

impl Upstream {
    /// Parse an `http` or `https` target such as "http://localhost:8080".
    pub fn parse(target: &str) -> Result<Self, RouteError> {
        let invalid = |reason: String| RouteError::InvalidTarget {
            target: target.to_string(),
            reason,
        };

        let origin = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
        match origin.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(RouteError::UnsupportedScheme {
                    target: target.to_string(),
                    scheme: scheme.to_string(),
                })
            }
        }

        let host = origin
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        let authority = match origin.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let host_header =
            HeaderValue::from_str(&authority).map_err(|e| invalid(e.to_string()))?;

        let base_path = origin.path().trim_end_matches('/').to_string();

        Ok(Self {
            origin,
            authority,
            base_path,
            host_header,
        })
    }

    /// `host[:port]` of the upstream, as sent in a rewritten Host header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn is_tls(&self) -> bool {
        self.origin.scheme() == "https"
    }

    /// Build the upstream URI for a forwarded path and query.
    ///
    /// A base path on the target is kept in front of `path`. Neither `path`
    /// nor `query` is re-encoded or normalized.
    pub fn uri_for(&self, path: &str, query: Option<&str>) -> Result<Uri, axum::http::Error> {
        let path_and_query = match query {
            Some(query) => format!("{}{}?{}", self.base_path, path, query),
            None => format!("{}{}", self.base_path, path),
        };

        Ok(Uri::builder()
            .scheme(self.origin.scheme())
            .authority(self.authority.as_str())
            .path_and_query(PathAndQuery::try_from(path_and_query)?)
            .build()?)
    }
}

/// A compiled proxy rule.
#[derive(Debug)]
pub struct RouteRule {
    matcher: Box<dyn Matcher>,
    upstream: Upstream,
    strip_prefix: bool,
    change_origin: bool,
    secure: bool,
    verify_tls: bool,
}

impl RouteRule {
    /// Compile a configured rule.
    ///
    /// Certificate verification is only skipped when the rule asks for it
    /// and insecure upstreams are explicitly allowed.
    pub fn from_config(config: &ProxyRuleConfig, allow_insecure: bool) -> Result<Self, RouteError> {
        let matcher = matcher::compile(&config.path).map_err(|source| RouteError::InvalidPattern {
            pattern: config.path.clone(),
            source,
        })?;
        let upstream = Upstream::parse(&config.target)?;

        Ok(Self {
            matcher,
            upstream,
            strip_prefix: config.strip_prefix,
            change_origin: config.change_origin,
            secure: config.secure,
            verify_tls: config.secure || !allow_insecure,
        })
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    pub fn strip_prefix(&self) -> bool {
        self.strip_prefix
    }

    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    /// The configured `secure` flag, before the opt-in gate is applied.
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Whether the upstream certificate is actually verified.
    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }
}

/// The result of routing a request.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The rule that matched.
    pub rule: &'a RouteRule,
    /// Position of the rule in the table.
    pub index: usize,
    /// Path sent upstream (after prefix stripping, without query).
    pub forward_path: String,
    /// Query string of the incoming request, unchanged.
    pub query: Option<String>,
}

impl RouteMatch<'_> {
    /// Full upstream URI including the query string.
    pub fn upstream_uri(&self) -> Result<Uri, axum::http::Error> {
        self.rule
            .upstream
            .uri_for(&self.forward_path, self.query.as_deref())
    }
}

/// Ordered, immutable set of proxy rules.
#[derive(Debug, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Compile all configured rules, preserving their order.
    pub fn from_config(
        rules: &[ProxyRuleConfig],
        security: &SecurityConfig,
    ) -> Result<Self, RouteError> {
        let rules = rules
            .iter()
            .map(|rule| RouteRule::from_config(rule, security.allow_insecure_upstreams))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// Find the first rule matching the request URI.
    pub fn match_uri(&self, uri: &Uri) -> Option<RouteMatch<'_>> {
        let path = uri.path();

        self.rules.iter().enumerate().find_map(|(index, rule)| {
            let matched = rule.matcher.match_prefix(path)?;
            let forward_path = if rule.strip_prefix {
                strip_prefix(path, &path[..matched])
            } else {
                path.to_string()
            };

            Some(RouteMatch {
                rule,
                index,
                forward_path,
                query: uri.query().map(str::to_string),
            })
        })
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// True if any rule talks TLS to its upstream without verification.
    pub fn needs_insecure_client(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.upstream.is_tls() && !rule.verify_tls)
    }
}
