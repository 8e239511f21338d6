//! Edge proxy server.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                      EDGE PROXY                      │
//!   CDN request   │  ┌─────────┐   ┌─────────┐   ┌──────────────────┐    │
//!  ───────────────┼─▶│  http   │──▶│ routing │──▶│ storage (signed) │────┼──▶ Object
//!                 │  │ server  │   └────┬────┘   └────────┬─────────┘    │    store
//!                 │  └─────────┘        │ purge           │              │
//!                 │                     ▼                 ▼              │
//!   CDN response  │               ┌──────────┐    ┌──────────────┐       │
//!  ◀──────────────┼───────────────│  purge   │    │    policy    │       │
//!                 │               └────┬─────┘    │ cors / cache │       │
//!                 │                    │          └──────────────┘       │
//!                 └────────────────────┼─────────────────────────────────┘
//!                                      ▼
//!                               CDN purge API
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use edge_proxy::config::load_config;
use edge_proxy::observability::{logging, metrics};
use edge_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "edge-proxy")]
#[command(about = "Signing edge proxy for an object-storage origin", long_about = None)]
struct Args {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet
            eprintln!("edge-proxy: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        https_redirect = !config.security.disable_https_redirect,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %config.listener.bind_address, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize server");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    if let Err(e) = server.run(listener, shutdown.subscribe()).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
