//! Live-view consumer
//!
//! The consumer runs on its own thread and never shares memory with the
//! logger: everything it knows arrives as [`PlotCommand`](crate::protocol::PlotCommand)
//! values over a crossbeam channel.
//!
//! # Architecture
//!
//! - [`RenderSurface`] - The drawing backend contract (figure with one axis per group)
//! - [`CommandLoop`] - Drains and applies commands, bounded by the aggregate quota
//! - [`Figure`] - Headless surface that keeps curves in memory and saves JSON snapshots
//! - [`LiveView`] - Producer-side handle that spawns, feeds and stops the consumer thread
//!
//! ```text
//!  Logger ──PlotCommand──▶ crossbeam channel ──▶ PlotterWorker
//!                                                  └─ CommandLoop ──▶ RenderSurface
//! ```

pub mod command_loop;
pub mod figure;
pub mod live_view;

pub use command_loop::{AxisMeta, CommandLoop, DrainReport, LoopState};
pub use figure::{Axis, Curve, Figure, FigureSnapshot};
pub use live_view::{LiveView, LiveViewState, PlotterExit, SurfaceFactory};

use crate::error::Result;
use crate::types::YScale;
use std::path::Path;

/// A drawing backend owned by the command loop.
///
/// Axes are addressed by group index. Implementations should report bad
/// indices as errors instead of panicking; the loop skips the offending
/// command and keeps going.
#[cfg_attr(test, mockall::automock)]
pub trait RenderSurface: Send {
    /// Discard the current layout and create `count` stacked axes
    fn make_axes(&mut self, count: usize) -> Result<()>;

    /// Remove all curves, legends and labels from every axis
    fn clear_all(&mut self) -> Result<()>;

    /// Add a curve to `axis`, applying its y-scale and grid
    fn plot(&mut self, axis: usize, yscale: YScale, xs: &[f64], ys: &[f64]) -> Result<()>;

    /// Set the legend entries of `axis`
    fn set_legend(&mut self, axis: usize, names: &[String]) -> Result<()>;

    /// Set axis labels of `axis`; empty strings leave a label unset
    fn set_labels(&mut self, axis: usize, xlabel: &str, ylabel: &str) -> Result<()>;

    /// Persist the current figure to `path`
    fn save(&mut self, path: &Path) -> Result<()>;

    /// Redraw after a batch of commands
    fn draw(&mut self) -> Result<()>;

    /// Release the surface
    fn close(&mut self);
}
