//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → routing table decides: proxy or static
//!     → proxy::Forwarder relays upstream response
//!       or static_files.rs serves from disk
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod static_files;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
pub use static_files::StaticAssets;
