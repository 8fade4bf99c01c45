//! Settings for the live-view consumer and for diagnostics output
//!
//! - [`LiveViewSettings`] - Polling period, shutdown wait and channel sizing
//! - [`LoggingConfig`] - `tracing` filter and optional log directory

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default consumer polling period in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default bounded wait for consumer shutdown in milliseconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5000;

/// Default `tracing` filter directive
pub const DEFAULT_LOG_FILTER: &str = "info,iterlog=debug";

/// Name of the consumer log file written when a log directory is set
pub const PLOTTER_LOG_FILE: &str = "plotter.log";

/// Tuning of the consumer thread that drains plot commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveViewSettings {
    /// Period between two drain ticks
    pub poll_interval_ms: u64,
    /// How long `terminate()` waits for the consumer to acknowledge `Stop`
    pub shutdown_timeout_ms: u64,
    /// Channel capacity; `None` means unbounded
    pub channel_capacity: Option<usize>,
}

impl Default for LiveViewSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            channel_capacity: None,
        }
    }
}

impl LiveViewSettings {
    /// Polling period as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Shutdown wait as a [`Duration`]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Diagnostics output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Directory receiving `plotter.log`; stderr only when `None`
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}
