//! heicker: HEIC to JPEG conversion service.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /convert
//!     ─────────────▶ http::server ──▶ admission::gate ──▶ upload::reader
//!                                                              │
//!                                                              ▼
//!     image/jpeg     http::response ◀── convert::pipeline ◀── codec
//!     ◀─────────────                    (blocking thread)    (heif|png → jpeg)
//!
//!     Cross-cutting: config, observability (logs, metrics, counter), lifecycle
//! ```

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use heicker::config::{self, Cli};
use heicker::lifecycle::wait_for_signal;
use heicker::observability::{logging, metrics};
use heicker::{HttpServer, Shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet; configuration errors go straight to stderr.
    let config = match config::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("heicker: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "heicker booting up");
    tracing::info!(
        ip = %config.listener.ip,
        port = config.listener.port,
        max_size_mb = config.limits.max_size_mb,
        max_concurrent = config.limits.max_concurrent,
        serve_path = %config.static_files.serve_path,
        jpeg_quality = config.conversion.jpeg_quality,
        "Runtime config built"
    );

    let listener = match TcpListener::bind(config.listener.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %config.listener.bind_address(), error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut serving => {
            return match result {
                Ok(Ok(())) => {
                    tracing::warn!("Listener closed");
                    ExitCode::SUCCESS
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Abnormal exit");
                    ExitCode::FAILURE
                }
                Err(e) => {
                    tracing::error!(error = %e, "Server task failed");
                    ExitCode::FAILURE
                }
            };
        }
        signal = wait_for_signal() => {
            tracing::warn!(signal, "Exiting");
            shutdown.trigger();
        }
    }

    match serving.await {
        Ok(Ok(())) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Error during shutdown");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Server task failed");
            ExitCode::FAILURE
        }
    }
}
