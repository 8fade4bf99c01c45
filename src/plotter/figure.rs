//! Headless render surface
//!
//! [`Figure`] keeps every axis' curves, legend and labels in memory. It does
//! not rasterise anything: `save` writes a JSON [`FigureSnapshot`] that
//! other tools can render or inspect.

use crate::error::{LogError, Result, ResultExt};
use crate::plotter::RenderSurface;
use crate::types::YScale;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// One plotted line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Curve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

/// One subplot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Axis {
    /// Curves in plotting order
    pub curves: Vec<Curve>,
    /// Y-axis scale applied by the last plot
    pub yscale: YScale,
    /// Whether horizontal grid lines are shown
    pub grid: bool,
    /// Legend entries
    pub legend: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xlabel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ylabel: Option<String>,
}

/// Saved state of a [`Figure`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSnapshot {
    /// When the snapshot was written
    pub saved_at: DateTime<Utc>,
    /// Number of redraws before the snapshot
    pub redraws: u64,
    /// Axes from top to bottom
    pub axes: Vec<Axis>,
}

impl FigureSnapshot {
    /// Read a snapshot written by [`Figure::save`](RenderSurface::save)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// In-memory figure with one axis per group
#[derive(Debug, Clone, Default)]
pub struct Figure {
    axes: Vec<Axis>,
    redraws: u64,
    closed: bool,
}

impl Figure {
    /// Create an empty figure without axes
    pub fn new() -> Self {
        Self::default()
    }

    /// Axes from top to bottom
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Number of completed redraws
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Whether [`RenderSurface::close`] was called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current state as a snapshot
    pub fn snapshot(&self) -> FigureSnapshot {
        FigureSnapshot {
            saved_at: Utc::now(),
            redraws: self.redraws,
            axes: self.axes.clone(),
        }
    }

    fn axis_mut(&mut self, axis: usize) -> Result<&mut Axis> {
        if self.closed {
            return Err(LogError::Command("figure is closed".to_string()));
        }
        let count = self.axes.len();
        self.axes
            .get_mut(axis)
            .ok_or_else(|| LogError::Command(format!("axis {} out of range ({} axes)", axis, count)))
    }
}

fn non_empty(label: &str) -> Option<String> {
    (!label.is_empty()).then(|| label.to_string())
}

impl RenderSurface for Figure {
    fn make_axes(&mut self, count: usize) -> Result<()> {
        if self.closed {
            return Err(LogError::Command("figure is closed".to_string()));
        }
        self.axes = vec![Axis::default(); count];
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        if self.closed {
            return Err(LogError::Command("figure is closed".to_string()));
        }
        for axis in &mut self.axes {
            *axis = Axis::default();
        }
        Ok(())
    }

    fn plot(&mut self, axis: usize, yscale: YScale, xs: &[f64], ys: &[f64]) -> Result<()> {
        let ax = self.axis_mut(axis)?;
        ax.yscale = yscale;
        ax.grid = true;
        ax.curves.push(Curve {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        });
        Ok(())
    }

    fn set_legend(&mut self, axis: usize, names: &[String]) -> Result<()> {
        self.axis_mut(axis)?.legend = names.to_vec();
        Ok(())
    }

    fn set_labels(&mut self, axis: usize, xlabel: &str, ylabel: &str) -> Result<()> {
        let ax = self.axis_mut(axis)?;
        if let Some(label) = non_empty(xlabel) {
            ax.xlabel = Some(label);
        }
        if let Some(label) = non_empty(ylabel) {
            ax.ylabel = Some(label);
        }
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("saving figure to {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.snapshot())?;
        writer
            .flush()
            .with_context(|| format!("saving figure to {}", path.display()))?;
        tracing::debug!("figure saved to {}", path.display());
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        if self.closed {
            return Err(LogError::Command("figure is closed".to_string()));
        }
        self.redraws += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
