//! # iterlog: iteration logging with a decoupled live plot
//!
//! Records scalar time series emitted by an iterative numerical process
//! (one entry per solver iteration, say) and optionally streams them to a
//! plotter thread that redraws on its own schedule, so the solver is never
//! slowed down by rendering.
//!
//! ## Architecture
//!
//! - **Series store**: groups (subplots) of named channels, each an
//!   append-only sequence with a shared per-group x-series
//! - **Logger**: the producer API; records one sample per channel per call
//!   and emits a full burst of plot commands after each call
//! - **Protocol**: typed [`PlotCommand`]s, processed strictly in send order,
//!   with a JSON-lines wire format for out-of-process consumers
//! - **Plotter**: a polled command loop that drains at most `aggregate`
//!   commands per tick (stopping on a burst boundary) and redraws a
//!   [`RenderSurface`]
//! - **Communication**: crossbeam channels; the producer never blocks
//!   except for the bounded wait in [`Logger::terminate`]
//!
//! ## Example
//!
//! ```
//! use iterlog::{LogConfig, Logger, RecordOptions, YScale};
//!
//! let config = LogConfig::default()
//!     .with_plot(false)
//!     .with_yscales(vec![YScale::Log, YScale::Linear]);
//! let mut log = Logger::new(vec![vec!["a", "b"], vec!["c"]], config).unwrap();
//!
//! log.record([1.0, 2.0, 3.0]).unwrap();
//! log.record_with([4.0, 5.0, 6.0], RecordOptions::new().with_x([10.0, 20.0]))
//!     .unwrap();
//!
//! assert_eq!(log.store().values(0, "a").unwrap(), &[1.0, 4.0]);
//! assert_eq!(log.store().group(0).unwrap().xs(), &[0.0, 10.0]);
//! assert_eq!(log.store().group(1).unwrap().xs(), &[0.0, 20.0]);
//!
//! log.terminate().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod logging;
pub mod plotter;
pub mod protocol;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{LiveViewSettings, LogConfig, LoggingConfig};
pub use error::{LogError, Result};
pub use logger::{GroupOutcome, Logger, RecordOptions, RecordOutcome};
pub use plotter::{CommandLoop, Figure, LiveView, LiveViewState, RenderSurface};
pub use protocol::PlotCommand;
pub use store::SeriesStore;
pub use types::{ChannelKey, GroupId, LogValue, YScale};
