//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (ordered rule scan)
//!     → matcher.rs (literal prefix or ^regex)
//!     → rewrite.rs (strip matched prefix)
//!     → Return: RouteMatch (rule, forwarded path, upstream URL) or None
//!
//! Route Compilation (at startup):
//!     ProxyRuleConfig[]
//!     → Compile matchers, parse upstream targets
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (configuration order)

use thiserror::Error;

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use router::{RouteMatch, RouteRule, RouteTable, Upstream};

/// Error compiling a proxy rule.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid path pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("unsupported scheme {scheme:?} in target {target:?}, expected http or https")]
    UnsupportedScheme { target: String, scheme: String },
}
