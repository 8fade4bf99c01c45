//! Test data builders for creating test loggers

use iterlog::{LiveViewSettings, LogConfig, Logger, RenderSurface};

/// Builder for creating test Loggers
pub struct LoggerBuilder {
    groups: Vec<Vec<String>>,
    config: LogConfig,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            config: LogConfig::default().with_live_view(LiveViewSettings {
                poll_interval_ms: 5,
                shutdown_timeout_ms: 2000,
                channel_capacity: None,
            }),
        }
    }

    pub fn group(mut self, names: &[&str]) -> Self {
        self.groups
            .push(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn plot(mut self, is_plot: bool) -> Self {
        self.config.is_plot = is_plot;
        self
    }

    pub fn aggregate(mut self, aggregate: usize) -> Self {
        self.config.aggregate = aggregate;
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn build(self) -> Logger {
        Logger::new(self.groups, self.config).unwrap()
    }

    pub fn build_with<F>(self, factory: F) -> Logger
    where
        F: FnOnce() -> Box<dyn RenderSurface> + Send + 'static,
    {
        Logger::with_surface(self.groups, self.config, factory).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_builder() {
        let log = LoggerBuilder::new()
            .group(&["a", "b"])
            .group(&["c"])
            .plot(false)
            .build();

        assert_eq!(log.channel_count(), 3);
        assert_eq!(log.store().group_count(), 2);
        assert!(!log.config().is_plot);
    }
}
