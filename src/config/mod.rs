//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (bind address, static root, insecure flag)
//!     → validation.rs (semantic checks)
//!     → DevServerConfig (validated, immutable)
//!     → compiled into RouteTable and shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::DevServerConfig;
pub use schema::ListenerConfig;
pub use schema::ProxyRuleConfig;
pub use schema::SecurityConfig;
pub use schema::StaticFilesConfig;
pub use schema::TimeoutConfig;
