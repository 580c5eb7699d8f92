//! Front-end development server with path-prefix reverse proxying.
//!
//! Requests whose path matches a configured prefix are forwarded to a fixed
//! upstream origin, optionally with the prefix stripped and the Host header
//! rewritten. Everything else is served from the static asset directory.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::DevServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
