//! Diagnostics setup
//!
//! iterlog itself only emits `tracing` events. Hosts that do not install
//! their own subscriber can call [`init`] once at startup.

use crate::config::{LoggingConfig, PLOTTER_LOG_FILE};
use crate::error::{LogError, Result, ResultExt};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. When `config.log_dir`
/// is set, events are also written to `plotter.log` in that directory; the
/// returned guard flushes that file on drop and must be kept alive.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, PLOTTER_LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| LogError::Config(format!("logging already initialised: {}", e)))?;

    Ok(guard)
}
