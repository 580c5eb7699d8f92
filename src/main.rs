//! dev-proxy
//!
//! Front-end dev server that forwards API prefixes to backend origins.
//!
//! ```text
//!     Browser ──▶ dev-proxy :5173 ──┬─ /api/golang/* ──▶ http://localhost:8080/*
//!                                   ├─ /api/node/*   ──▶ http://localhost:3000/*
//!                                   └─ anything else ──▶ static assets
//! ```

use std::path::PathBuf;

use clap::Parser;

use dev_proxy::config::loader::read_config;
use dev_proxy::config::validation::validate_config;
use dev_proxy::config::ConfigError;
use dev_proxy::lifecycle::{signals::shutdown_signal, startup};
use dev_proxy::observability::init_logging;
use dev_proxy::{DevServerConfig, HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "dev-proxy", version)]
#[command(about = "Front-end dev server with path-prefix API proxying", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in rules are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override static_files.root.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Allow rules with `secure = false` to skip upstream certificate checks.
    #[arg(long)]
    insecure: bool,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut DevServerConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(root) = self.static_dir {
            config.static_files.root = Some(root);
        }
        if self.insecure {
            config.security.allow_insecure_upstreams = true;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => DevServerConfig::default(),
    };
    args.apply(&mut config);

    init_logging(&config.observability.log_level);
    tracing::info!("dev-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    validate_config(&config).map_err(ConfigError::Validation)?;

    let listener = startup::bind(&config.listener).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
