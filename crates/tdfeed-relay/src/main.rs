//! tdfeed relay
//!
//! Subscribes to the TD feed (or replays recorded batches), decodes every
//! batch and writes one line per event to stdout or to forwarding clients.
//! Logs go to stderr so stdout carries event lines only.
//!
//! Usage: `tdfeed-relay [config.yaml]`

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use tdfeed_relay::{app, config};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());

    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(%path, error = %e, "config load failed");
            return ExitCode::FAILURE;
        }
    };

    match app::run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "relay failed");
            ExitCode::FAILURE
        }
    }
}
