//! Configuration module for iterlog
//!
//! [`LogConfig`] carries the logger options: whether to plot live, the
//! consumer's per-tick command quota, and per-group axis overrides. It can
//! be built in code or parsed from an in-memory TOML document.
//!
//! # Example
//!
//! ```
//! use iterlog::config::LogConfig;
//! use iterlog::types::YScale;
//!
//! let config = LogConfig::from_toml_str(
//!     r#"
//!     is_plot = false
//!     aggregate = 50
//!     yscales = ["log", "linear"]
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.aggregate, 50);
//! assert_eq!(config.yscale(0), YScale::Log);
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{LogError, Result};
use crate::types::{YScale, DEFAULT_XLABEL};
use serde::{Deserialize, Serialize};

/// Default maximum number of commands the consumer applies per drain tick
pub const DEFAULT_AGGREGATE: usize = 200;

/// Logger options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether to attempt live plotting
    pub is_plot: bool,
    /// Commands processed per drain before the consumer forces a redraw
    pub aggregate: usize,
    /// Per-group y-axis scale, `linear` when absent
    pub yscales: Option<Vec<YScale>>,
    /// Per-group x-axis labels, `"iteration"` when absent
    pub xlabels: Option<Vec<String>>,
    /// Per-group y-axis labels, empty when absent
    pub ylabels: Option<Vec<String>>,
    /// Consumer thread tuning
    pub live_view: LiveViewSettings,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            is_plot: true,
            aggregate: DEFAULT_AGGREGATE,
            yscales: None,
            xlabels: None,
            ylabels: None,
            live_view: LiveViewSettings::default(),
        }
    }
}

impl LogConfig {
    /// Parse options from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Serialize options to a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LogError::Serialization(e.to_string()))
    }

    /// Disable or enable live plotting
    pub fn with_plot(mut self, is_plot: bool) -> Self {
        self.is_plot = is_plot;
        self
    }

    /// Set the per-tick command quota
    pub fn with_aggregate(mut self, aggregate: usize) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Set per-group y-scales
    pub fn with_yscales(mut self, yscales: Vec<YScale>) -> Self {
        self.yscales = Some(yscales);
        self
    }

    /// Set per-group x labels
    pub fn with_xlabels(mut self, xlabels: Vec<String>) -> Self {
        self.xlabels = Some(xlabels);
        self
    }

    /// Set per-group y labels
    pub fn with_ylabels(mut self, ylabels: Vec<String>) -> Self {
        self.ylabels = Some(ylabels);
        self
    }

    /// Set consumer tuning
    pub fn with_live_view(mut self, live_view: LiveViewSettings) -> Self {
        self.live_view = live_view;
        self
    }

    /// Check the options against the number of groups they describe
    pub fn validate(&self, group_count: usize) -> Result<()> {
        if self.aggregate == 0 {
            return Err(LogError::Config("aggregate must be at least 1".to_string()));
        }
        if self.live_view.poll_interval_ms == 0 {
            return Err(LogError::Config(
                "live view poll interval must be non-zero".to_string(),
            ));
        }
        check_override_len("yscales", self.yscales.as_ref().map(Vec::len), group_count)?;
        check_override_len("xlabels", self.xlabels.as_ref().map(Vec::len), group_count)?;
        check_override_len("ylabels", self.ylabels.as_ref().map(Vec::len), group_count)?;
        Ok(())
    }

    /// Y-scale of group `ig`
    pub fn yscale(&self, ig: usize) -> YScale {
        self.yscales
            .as_ref()
            .and_then(|v| v.get(ig).copied())
            .unwrap_or_default()
    }

    /// X label of group `ig`
    pub fn xlabel(&self, ig: usize) -> String {
        self.xlabels
            .as_ref()
            .and_then(|v| v.get(ig).cloned())
            .unwrap_or_else(|| DEFAULT_XLABEL.to_string())
    }

    /// Y label of group `ig`
    pub fn ylabel(&self, ig: usize) -> String {
        self.ylabels
            .as_ref()
            .and_then(|v| v.get(ig).cloned())
            .unwrap_or_default()
    }
}

fn check_override_len(field: &str, len: Option<usize>, group_count: usize) -> Result<()> {
    match len {
        Some(len) if len != group_count => Err(LogError::Config(format!(
            "{} has {} entries but there are {} groups",
            field, len, group_count
        ))),
        _ => Ok(()),
    }
}
