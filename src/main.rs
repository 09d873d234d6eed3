//! # Rocket Telemetry
//!
//! Ground-station telemetry ingestion for the rocket payload.
//!
//! This application polls the payload receiver over USB or serial, decodes
//! each frame and keeps the latest sample and plotting windows in memory.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (`config/default.toml` or the first argument)
//!    - Set up logging with tracing subscriber
//!    - Open the configured link; a missing device aborts startup
//!
//! 2. **Main Loop**
//!    - Acquire, decode and store a frame every `acquire_interval_ms`
//!    - Log position every `position_interval_ms`
//!    - Report all readouts once a second from the store
//!
//! 3. **Graceful Shutdown**
//!    - Ctrl+C stops polling and logs final counters
//!
//! # Examples
//!
//! ```bash
//! SERIAL_PORT=/dev/ttyUSB0 cargo run --release -- config/serial.toml
//! ```

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use rocket_telemetry::config::{Config, LoggingConfig};
use rocket_telemetry::display;
use rocket_telemetry::link::open_link;
use rocket_telemetry::poll::PollLoop;
use rocket_telemetry::store::SampleStore;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Dashboard-style readout refresh period
const REPORT_INTERVAL_MS: u64 = 1000;

/// Prefix of rolling log files
const LOG_FILE_PREFIX: &str = "rocket-telemetry.log";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);

    info!("Rocket Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Link: {:?}", config.link.kind);

    // Device-not-found is fatal before the poll loop begins
    let link = open_link(&config).context("Failed to open telemetry link")?;

    let store = Arc::new(SampleStore::new());
    let reporter = tokio::spawn(report(Arc::clone(&store)));

    let poll = PollLoop::new(link, Arc::clone(&store), &config.poll);
    info!("Press Ctrl+C to exit");

    let stats = poll.run(shutdown_signal()).await;
    reporter.abort();

    info!(
        "Total cycles: {} (updated {}, link failures {}, rejected frames {})",
        stats.cycles, stats.updates, stats.link_failures, stats.decode_failures
    );

    Ok(())
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. When a log
/// directory is configured, output is also written to a daily rolling file;
/// the returned guard must live until exit so buffered lines are flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stdout.and(file_writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

/// Resolve on Ctrl+C
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => {
            warn!("Unable to listen for Ctrl+C ({}); running until killed", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Log the dashboard readouts from the store once per refresh period
async fn report(store: Arc<SampleStore>) {
    let mut ticker = interval(Duration::from_millis(REPORT_INTERVAL_MS));
    loop {
        ticker.tick().await;
        let snapshot = store.snapshot();

        for line in display::status_lines(&snapshot, chrono::Utc::now()) {
            info!("{}", line);
        }

        match snapshot.to_json() {
            Ok(json) => debug!("Snapshot: {}", json),
            Err(e) => warn!("Failed to serialize snapshot: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_interval_constant() {
        // Slow consumer tier of the dashboard
        assert_eq!(REPORT_INTERVAL_MS, 1000);
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_default_config_is_usb() {
        let config = Config::default();
        assert_eq!(config.link.kind, rocket_telemetry::config::LinkKind::Usb);
    }
}
