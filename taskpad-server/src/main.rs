//! `taskpad-server` -- development backend for `taskpad`.
//!
//! Serves accounts and per-user task documents from memory over HTTP.
//! Nothing is persisted across restarts.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:9400
//! cargo run --bin taskpad-server
//!
//! # Run on custom address
//! cargo run --bin taskpad-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! TASKPAD_ADDR=127.0.0.1:8080 cargo run --bin taskpad-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskpad_server::config::{ServerCliArgs, ServerConfig};
use taskpad_server::server;
use taskpad_server::store::DocumentStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskpad server");

    let store = Arc::new(DocumentStore::with_min_password_len(config.min_password_len));

    match server::start_server_with_state(&config.bind_addr, store).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "taskpad server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
