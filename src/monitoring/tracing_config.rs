//! Structured logging with tracing
//!
//! Sets up:
//! - Console logging, text or JSON
//! - File logging with daily rotation, always JSON
//! - Level filtering from RUST_LOG

use super::config::{LogFormat, MonitoringConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_PREFIX: &str = "humanizer.log";

/// Initialize the global subscriber.
///
/// Returns the file writer guard when file logging is on; it must be kept
/// alive for the duration of the program or buffered lines are lost.
pub fn init_tracing(config: &MonitoringConfig) -> std::io::Result<Option<WorkerGuard>> {
    if !config.enabled {
        return Ok(None);
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let console_layer = config.enable_console_logging.then(|| {
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
        match config.log_format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Text => layer.boxed(),
        }
    });

    let mut guard = None;
    let file_layer = if config.enable_file_logging {
        config.ensure_log_dir()?;
        let (writer, file_guard) = tracing_appender::non_blocking(daily(&config.log_dir, LOG_FILE_PREFIX));
        guard = Some(file_guard);
        Some(fmt::layer().with_writer(writer).with_ansi(false).json())
    } else {
        None
    };

    // A subscriber may already be installed (tests); that is not an error
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(guard)
}
