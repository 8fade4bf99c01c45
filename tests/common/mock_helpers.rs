//! Recording render surfaces for observing the plotter thread

use iterlog::error::{LogError, Result};
use iterlog::{RenderSurface, YScale};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One call made on a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    MakeAxes(usize),
    ClearAll,
    Plot {
        axis: usize,
        yscale: YScale,
        xs: Vec<f64>,
        ys: Vec<f64>,
    },
    Legend(usize, Vec<String>),
    Labels(usize, String, String),
    Save(PathBuf),
    Draw,
    Close,
}

/// Shared event log, readable from the test thread
pub type EventLog = Arc<Mutex<Vec<SurfaceEvent>>>;

/// A surface that records every call and accepts everything
pub struct RecordingSurface {
    events: EventLog,
    fail_make_axes: bool,
}

impl RecordingSurface {
    /// Create a surface and the log it writes into
    pub fn new() -> (Self, EventLog) {
        let events = EventLog::default();
        (
            Self {
                events: events.clone(),
                fail_make_axes: false,
            },
            events,
        )
    }

    /// Create a surface whose axes can never be built
    pub fn broken() -> (Self, EventLog) {
        let (mut surface, events) = Self::new();
        surface.fail_make_axes = true;
        (surface, events)
    }

    fn push(&self, event: SurfaceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RenderSurface for RecordingSurface {
    fn make_axes(&mut self, count: usize) -> Result<()> {
        if self.fail_make_axes {
            return Err(LogError::Command("no display available".to_string()));
        }
        self.push(SurfaceEvent::MakeAxes(count));
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.push(SurfaceEvent::ClearAll);
        Ok(())
    }

    fn plot(&mut self, axis: usize, yscale: YScale, xs: &[f64], ys: &[f64]) -> Result<()> {
        self.push(SurfaceEvent::Plot {
            axis,
            yscale,
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        });
        Ok(())
    }

    fn set_legend(&mut self, axis: usize, names: &[String]) -> Result<()> {
        self.push(SurfaceEvent::Legend(axis, names.to_vec()));
        Ok(())
    }

    fn set_labels(&mut self, axis: usize, xlabel: &str, ylabel: &str) -> Result<()> {
        self.push(SurfaceEvent::Labels(
            axis,
            xlabel.to_string(),
            ylabel.to_string(),
        ));
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        self.push(SurfaceEvent::Save(path.to_path_buf()));
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        self.push(SurfaceEvent::Draw);
        Ok(())
    }

    fn close(&mut self) {
        self.push(SurfaceEvent::Close);
    }
}

/// Snapshot of the events recorded so far
pub fn events(log: &EventLog) -> Vec<SurfaceEvent> {
    log.lock().unwrap().clone()
}

/// The plot events following the last `ClearAll`
pub fn last_frame(log: &EventLog) -> Vec<SurfaceEvent> {
    let events = events(log);
    let start = events
        .iter()
        .rposition(|e| *e == SurfaceEvent::ClearAll)
        .map(|i| i + 1)
        .unwrap_or(0);
    events[start..]
        .iter()
        .filter(|e| matches!(e, SurfaceEvent::Plot { .. }))
        .cloned()
        .collect()
}
