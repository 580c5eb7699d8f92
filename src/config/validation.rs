//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every rule compiles (pattern and target)
//! - Reject rules that can never match because an earlier prefix shadows them
//! - Gate unverified TLS upstreams behind the explicit opt-in flag
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DevServerConfig, ProxyRuleConfig};
use crate::routing::matcher::{self, is_regex_pattern};
use crate::routing::Upstream;

/// A semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {address:?} is not a socket address")]
    InvalidBindAddress { address: String },

    #[error("proxy[{index}]: path is empty")]
    EmptyPath { index: usize },

    #[error("proxy[{index}]: path {path:?} must start with '/' or '^'")]
    RelativePath { index: usize, path: String },

    #[error("proxy[{index}]: invalid pattern {path:?}: {reason}")]
    InvalidPattern {
        index: usize,
        path: String,
        reason: String,
    },

    #[error("proxy[{index}]: {reason}")]
    InvalidTarget { index: usize, reason: String },

    #[error(
        "proxy[{index}]: {target} sets secure = false but security.allow_insecure_upstreams is off"
    )]
    InsecureNotAllowed { index: usize, target: String },

    #[error("proxy[{index}]: path {path:?} is unreachable, shadowed by {shadowed_by:?}")]
    ShadowedRule {
        index: usize,
        path: String,
        shadowed_by: String,
    },

    #[error("timeouts.connect_secs must be greater than zero")]
    ZeroConnectTimeout,

    #[error("timeouts.upstream_secs must be greater than zero when set")]
    ZeroUpstreamTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DevServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            address: config.listener.bind_address.clone(),
        });
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.timeouts.upstream_secs == Some(0) {
        errors.push(ValidationError::ZeroUpstreamTimeout);
    }

    for (index, rule) in config.proxy.iter().enumerate() {
        validate_rule(
            index,
            rule,
            config.security.allow_insecure_upstreams,
            &mut errors,
        );
    }

    check_shadowed(&config.proxy, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_rule(
    index: usize,
    rule: &ProxyRuleConfig,
    allow_insecure: bool,
    errors: &mut Vec<ValidationError>,
) {
    if rule.path.is_empty() {
        errors.push(ValidationError::EmptyPath { index });
    } else if is_regex_pattern(&rule.path) {
        if let Err(e) = matcher::compile(&rule.path) {
            errors.push(ValidationError::InvalidPattern {
                index,
                path: rule.path.clone(),
                reason: e.to_string(),
            });
        }
    } else if !rule.path.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            index,
            path: rule.path.clone(),
        });
    }

    match Upstream::parse(&rule.target) {
        Ok(upstream) => {
            if upstream.is_tls() && !rule.secure && !allow_insecure {
                errors.push(ValidationError::InsecureNotAllowed {
                    index,
                    target: rule.target.clone(),
                });
            }
        }
        Err(e) => errors.push(ValidationError::InvalidTarget {
            index,
            reason: e.to_string(),
        }),
    }
}

fn is_literal(rule: &ProxyRuleConfig) -> bool {
    !rule.path.is_empty() && !is_regex_pattern(&rule.path)
}

// Only literal prefixes are compared; regex overlap is not decidable here.
fn check_shadowed(rules: &[ProxyRuleConfig], errors: &mut Vec<ValidationError>) {
    for (index, rule) in rules.iter().enumerate().filter(|(_, r)| is_literal(r)) {
        let earlier = rules[..index]
            .iter()
            .filter(|r| is_literal(r))
            .find(|r| rule.path.starts_with(&r.path));

        if let Some(earlier) = earlier {
            errors.push(ValidationError::ShadowedRule {
                index,
                path: rule.path.clone(),
                shadowed_by: earlier.path.clone(),
            });
        }
    }
}
