use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

const PICKUP_CONFIG_ENV_NAME: &str = "PICKUP_CONFIG_PATH";
const DEFAULT_LOG_FILTER: &str = "info";

/// Get config path from input or env PICKUP_CONFIG_PATH
pub fn get_config_path(config: Option<PathBuf>) -> Option<PathBuf> {
    if config.is_some() {
        config
    } else {
        std::env::var(PICKUP_CONFIG_ENV_NAME)
            .map(|s| {
                warn!("### ENV VAR {s} is used ###");
                PathBuf::from(s)
            })
            .ok()
    }
}

/// Initializes the global subscriber.
///
/// Human readable events go to stdout, filtered by `RUST_LOG` (default
/// `info`). With `log_directory`, every event including the traces of
/// `pickup_tracing` is also written as JSON to a daily rolling `trace.*`
/// file. Keep the returned guard alive until the end of the program.
pub fn init_tracing(log_directory: Option<&Path>) -> Option<WorkerGuard> {
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let (file_layer, guard) = match log_directory {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "trace"));
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_current_span(false)
                .with_filter(LevelFilter::TRACE);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(stdout_filter))
        .with(file_layer)
        .init();
    guard
}
