//! Command protocol between the logger and the live view.
//!
//! Commands are processed strictly in send order. The protocol is stateful:
//! [`PlotCommand::SetGroup`] selects the group that the following
//! [`PlotCommand::Plot`] draws into.
//!
//! Every `record()` call sends a full burst rather than a diff:
//!
//! ```text
//! [Save] Clear {SetGroup Plot}* Legends Continue
//! ```
//!
//! # Wire format
//!
//! For consumers living in another process the commands serialize to one
//! JSON object per line, tagged by `"cmd"`:
//!
//! ```text
//! {"cmd":"set_group","group":0}
//! {"cmd":"plot","xs":[0.0,1.0],"ys":[3.5,1.25]}
//! {"cmd":"stop"}
//! ```

use crate::error::{LogError, Result};
use crate::store::SeriesStore;
use crate::types::{GroupId, YScale};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// A single command sent from the logger to the live view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlotCommand {
    /// Select the current group for subsequent `Plot` commands
    SetGroup { group: GroupId },
    /// Add a curve to the current group's axis
    Plot { xs: Vec<f64>, ys: Vec<f64> },
    /// Clear all axes
    Clear,
    /// Apply legends and axis labels to all axes
    Legends,
    /// Declare or redeclare one group's axis
    AddAxis {
        group: GroupId,
        names: Vec<String>,
        yscale: YScale,
        xlabel: String,
        ylabel: String,
    },
    /// Persist the current figure
    Save { path: PathBuf },
    /// End of one burst
    Continue,
    /// Terminate the live view
    Stop,
}

impl PlotCommand {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            PlotCommand::SetGroup { .. } => "set_group",
            PlotCommand::Plot { .. } => "plot",
            PlotCommand::Clear => "clear",
            PlotCommand::Legends => "legends",
            PlotCommand::AddAxis { .. } => "add_axis",
            PlotCommand::Save { .. } => "save",
            PlotCommand::Continue => "continue",
            PlotCommand::Stop => "stop",
        }
    }

    /// Whether this is the `Stop` sentinel
    pub fn is_stop(&self) -> bool {
        matches!(self, PlotCommand::Stop)
    }

    /// Build a `Save` command
    pub fn save(path: impl AsRef<Path>) -> Self {
        PlotCommand::Save {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// The full set of commands describing the current content of `store`.
///
/// One `SetGroup`/`Plot` pair is produced per channel, in channel order.
pub fn plot_burst(store: &SeriesStore) -> Vec<PlotCommand> {
    let mut burst = Vec::with_capacity(2 * store.channel_count() + 3);
    burst.push(PlotCommand::Clear);
    for group in 0..store.group_count() {
        let Some(snapshot) = store.snapshot(group) else {
            continue;
        };
        for series in snapshot.series {
            burst.push(PlotCommand::SetGroup { group });
            burst.push(PlotCommand::Plot {
                xs: snapshot.xs.to_vec(),
                ys: series.values().to_vec(),
            });
        }
    }
    burst.push(PlotCommand::Legends);
    burst.push(PlotCommand::Continue);
    burst
}

/// `AddAxis` command describing group `ig` of `store`
pub fn add_axis_command(store: &SeriesStore, ig: GroupId) -> Option<PlotCommand> {
    let group = store.group(ig)?;
    Some(PlotCommand::AddAxis {
        group: ig,
        names: group.names.clone(),
        yscale: group.yscale,
        xlabel: group.xlabel.clone(),
        ylabel: group.ylabel.clone(),
    })
}

/// Write one command as a JSON line
pub fn encode_line<W: Write>(writer: &mut W, command: &PlotCommand) -> Result<()> {
    serde_json::to_writer(&mut *writer, command)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Parse one JSON line into a command
pub fn decode_line(line: &str) -> Result<PlotCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Err(LogError::Serialization("empty command line".to_string()));
    }
    Ok(serde_json::from_str(line)?)
}

/// Read all commands from a JSON-lines stream, skipping blank lines
pub fn decode_stream<R: BufRead>(reader: R) -> Result<Vec<PlotCommand>> {
    let mut commands = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        commands.push(decode_line(&line)?);
    }
    Ok(commands)
}
