//! Tracing setup for the `sightline` binary.
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `sightline=info,warn`).
//! Setting `SIGHTLINE_LOG_DIR` also appends plain-text logs to
//! `<dir>/sightline.log`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directory for the optional log file.
pub const LOG_DIR_ENV: &str = "SIGHTLINE_LOG_DIR";

const DEFAULT_FILTER: &str = "sightline=info,warn";
const LOG_FILE: &str = "sightline.log";

/// Install the global subscriber. Keep the returned guard alive until exit
/// or buffered file output is lost.
pub fn init() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    match std::env::var_os(LOG_DIR_ENV).filter(|dir| !dir.is_empty()) {
        Some(log_dir) => {
            let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            registry
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
            tracing::debug!(dir = %log_dir.to_string_lossy(), "logging to file");
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}
