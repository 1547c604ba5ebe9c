//! Edge Proxy
//!
//! One HTTP entry point serving a project's static files and HTML pages,
//! plus a constrained forward proxy for absolute URLs.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ routing ──┬──▶ site (PathGuard → file / page)
//!                                               │
//!                                               └──▶ proxy (auth → SSRF → fetch)
//!                                                          │
//!     Client Response                                      ▼
//!     ◀────────────── relay (status, sanitized headers, streamed body)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_proxy::config::loader::{self, ConfigError};
use edge_proxy::config::validation::validate_config;
use edge_proxy::lifecycle::signals::spawn_signal_listener;
use edge_proxy::observability::{logging, metrics};
use edge_proxy::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "edge-proxy")]
#[command(about = "Static site server and password-gated forward proxy", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root (overrides config and PROJECT_ROOT).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Listen address (overrides config and BIND_ADDRESS).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = loader::load(args.config.as_deref())?;
    if let Some(root) = args.root {
        config.site.root = root;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability)?;
    tracing::info!("edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        root = %config.site.root.display(),
        proxy_prefix = %config.proxy.prefix,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!(signalled = shutdown.is_triggered(), "Shutdown complete");
    Ok(())
}
