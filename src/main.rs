//! Breach lookup service.
//!
//! Answers whether a password or username appears in a set of leaked
//! credential lists, and which breach each match came from.
//!
//! ```text
//!   client ──▶ axum router ──┬── GET  /, /app.js   (static interface)
//!                            ├── GET  /health
//!                            ├── GET  /stats
//!                            └── rate limiter ──▶ POST /password, /username
//!                                                   validate → escape → query
//!                                                        │
//!                                                        ▼
//!                                               SQLite credential store
//!                                          (built once from data/*/*.txt)
//! ```

use std::path::PathBuf;

use clap::Parser;

use breach_lookup::config::{load_config, validate_config, ConfigError, ServiceConfig};
use breach_lookup::lifecycle::{signals, startup, Shutdown};
use breach_lookup::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "breach-lookup", version)]
#[command(about = "Search leaked credential lists for passwords and usernames", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve HTTPS instead of HTTP.
    #[arg(long)]
    https: bool,

    /// Create a self-signed certificate if none exists.
    #[arg(long)]
    create_certs: bool,

    /// Rebuild the credential store from the data directory before serving.
    #[arg(long)]
    rebuild: bool,
}

impl Args {
    fn resolve_config(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.https {
            config.tls.enabled = true;
        }
        if self.create_certs {
            config.tls.auto_provision = true;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.resolve_config()?;

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "breach-lookup starting");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    startup::run(config, args.rebuild, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
