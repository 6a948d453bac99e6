//! Task API server
//!
//! A small task-tracking HTTP API built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                      TASK API                        │
//!                   │                                                      │
//!   Client Request  │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!   ────────────────┼─▶│  http   │───▶│ routing  │───▶│    tasks     │     │
//!                   │  │ server  │    │ dispatch │    │   handlers   │     │
//!                   │  └─────────┘    └──────────┘    └──────┬───────┘     │
//!                   │                                        │             │
//!                   │                                        ▼             │
//!                   │                                 ┌──────────────┐     │
//!                   │                                 │    store     │     │
//!                   │                                 │ (+ db.json)  │     │
//!                   │                                 └──────────────┘     │
//!                   │                                                      │
//!                   │  config · observability · lifecycle                  │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use task_api::config::load_or_default;
use task_api::lifecycle::startup;
use task_api::observability::{logging, metrics};
use task_api::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "task-api")]
#[command(about = "HTTP API for managing tasks", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("task-api v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        store_path = %config.storage.path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address already validated by the config loader.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let store = startup::open_store(&config.storage)?;
    let listener = startup::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store, shutdown.clone())?;
    server.run(listener, shutdown.subscribe()).await?;

    if shutdown.is_fatal() {
        return Err("stopped after a storage failure".into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
