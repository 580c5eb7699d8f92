//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! RouteMatch + incoming Request
//!     → headers.rs (drop hop-by-hop, optional Host rewrite)
//!     → forward.rs (hyper client, verbatim URI, streamed body)
//!     → Upstream response relayed unchanged
//!     → error.rs on failure (502 / 504)
//! ```

pub mod error;
pub mod forward;
pub mod headers;

pub use error::ProxyError;
pub use forward::Forwarder;
