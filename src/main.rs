//! Form relay server.
//!
//! ```text
//!   Browser                    ┌──────────────── form-relay ────────────────┐
//!   POST /api/proxy?url=...    │                                            │
//!   ───────────────────────────┼─▶ request id ─▶ relay handler ─▶ upstream ─┼──▶ Target
//!                              │                     │            (POST)    │
//!   ◀──────────────────────────┼── CORS headers ◀── JSON / {"error"} ◀──────┼─── JSON reply
//!                              └────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use form_relay::config::{load_config, validate_config, ConfigError, RelayConfig};
use form_relay::lifecycle::signals::spawn_signal_listener;
use form_relay::observability::{logging, metrics};
use form_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "form-relay")]
#[command(about = "Relays form posts to a target URL and returns its JSON with CORS headers", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "form-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        relay_path = %config.relay.path,
        max_body_bytes = config.relay.max_body_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
