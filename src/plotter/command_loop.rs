//! Command loop of the live view
//!
//! The loop is a small state machine:
//!
//! ```text
//! Idle ──AddAxis──▶ Active ──Stop / channel closed──▶ Terminated
//! ```
//!
//! Each [`CommandLoop::drain`] call is one tick of the consumer. It takes
//! commands off the channel until the channel is empty, or until the
//! aggregate quota has been reached and a `Continue` boundary is seen, and
//! requests a redraw if anything was processed. `Stop` ends the loop
//! immediately regardless of the quota.

use crate::error::{LogError, Result};
use crate::plotter::RenderSurface;
use crate::protocol::PlotCommand;
use crate::types::{GroupId, YScale};
use crossbeam_channel::{Receiver, TryRecvError};

/// Lifecycle of the command loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// No axes have been built yet
    #[default]
    Idle,
    /// Axes exist, one per group
    Active,
    /// `Stop` received, surface released
    Terminated,
}

/// Per-group axis metadata kept by the consumer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisMeta {
    pub names: Vec<String>,
    pub yscale: YScale,
    pub xlabel: String,
    pub ylabel: String,
}

/// Outcome of one drain tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Commands counted against the quota
    pub processed: usize,
    /// Commands taken off the channel, including the closing `Continue`
    pub consumed: usize,
    /// Commands that failed to apply and were skipped
    pub skipped: usize,
    /// Whether a redraw was requested
    pub redrawn: bool,
    /// Whether the loop terminated during this tick
    pub terminated: bool,
}

/// Consumer-side state machine applying [`PlotCommand`]s to a [`RenderSurface`]
pub struct CommandLoop {
    state: LoopState,
    surface: Option<Box<dyn RenderSurface>>,
    axes: Vec<AxisMeta>,
    current_group: Option<GroupId>,
    aggregate: usize,
    total_processed: u64,
}

impl std::fmt::Debug for CommandLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandLoop")
            .field("state", &self.state)
            .field("axes", &self.axes)
            .field("current_group", &self.current_group)
            .field("aggregate", &self.aggregate)
            .field("total_processed", &self.total_processed)
            .finish()
    }
}

impl CommandLoop {
    /// Create an idle loop; axes are built by the first `AddAxis`
    pub fn new(surface: Box<dyn RenderSurface>, aggregate: usize) -> Self {
        Self {
            state: LoopState::Idle,
            surface: Some(surface),
            axes: Vec::new(),
            current_group: None,
            aggregate,
            total_processed: 0,
        }
    }

    /// Create a loop and immediately build one axis per entry of `axes`
    pub fn with_axes(
        surface: Box<dyn RenderSurface>,
        aggregate: usize,
        axes: Vec<AxisMeta>,
    ) -> Result<Self> {
        let mut command_loop = Self::new(surface, aggregate);
        if !axes.is_empty() {
            command_loop.axes = axes;
            command_loop.make_axes()?;
        }
        Ok(command_loop)
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Group selected by the last `SetGroup`
    pub fn current_group(&self) -> Option<GroupId> {
        self.current_group
    }

    /// Axis metadata known to the consumer
    pub fn axes(&self) -> &[AxisMeta] {
        &self.axes
    }

    /// Commands processed over the loop's lifetime
    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    /// Run one tick: drain pending commands from `rx` and redraw.
    pub fn drain(&mut self, rx: &Receiver<PlotCommand>) -> DrainReport {
        let mut report = DrainReport::default();
        if self.state == LoopState::Terminated {
            report.terminated = true;
            return report;
        }

        let mut ii = 0;
        loop {
            let command = match rx.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("command channel closed without stop");
                    self.finish_tick(&mut report, ii);
                    self.terminate();
                    report.terminated = true;
                    return report;
                }
            };
            report.consumed += 1;
            tracing::trace!(command = command.name());

            let mut can_break = false;
            match command {
                PlotCommand::Stop => {
                    report.processed = ii;
                    self.total_processed += ii as u64;
                    self.terminate();
                    report.terminated = true;
                    return report;
                }
                PlotCommand::Continue => can_break = true,
                other => {
                    let name = other.name();
                    if let Err(e) = self.apply(other) {
                        tracing::warn!("skipping {} command: {}", name, e);
                        report.skipped += 1;
                    }
                }
            }

            if ii >= self.aggregate && can_break {
                break;
            }
            ii += 1;
        }

        self.finish_tick(&mut report, ii);
        report
    }

    fn finish_tick(&mut self, report: &mut DrainReport, processed: usize) {
        report.processed = processed;
        self.total_processed += processed as u64;
        if processed == 0 {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            match surface.draw() {
                Ok(()) => report.redrawn = true,
                Err(e) => tracing::warn!("redraw failed: {}", e),
            }
        }
        tracing::debug!("processed {} commands", processed);
    }

    /// Apply a single command to the surface.
    ///
    /// `Continue` is a no-op here; `Stop` terminates the loop.
    pub fn apply(&mut self, command: PlotCommand) -> Result<()> {
        match command {
            PlotCommand::SetGroup { group } => {
                if group >= self.axes.len() {
                    return Err(LogError::Command(format!(
                        "group {} selected but only {} axes exist",
                        group,
                        self.axes.len()
                    )));
                }
                self.current_group = Some(group);
                Ok(())
            }
            PlotCommand::Plot { xs, ys } => {
                let ig = self
                    .current_group
                    .ok_or_else(|| LogError::Command("plot before any group was selected".into()))?;
                if xs.len() != ys.len() {
                    return Err(LogError::Command(format!(
                        "plot has {} x values but {} y values",
                        xs.len(),
                        ys.len()
                    )));
                }
                let yscale = self.axes[ig].yscale;
                self.active_surface()?.plot(ig, yscale, &xs, &ys)
            }
            PlotCommand::Clear => self.active_surface()?.clear_all(),
            PlotCommand::Legends => {
                let surface = active_surface(self.state, &mut self.surface)?;
                for (ig, meta) in self.axes.iter().enumerate() {
                    surface.set_legend(ig, &meta.names)?;
                    if !meta.xlabel.is_empty() || !meta.ylabel.is_empty() {
                        surface.set_labels(ig, &meta.xlabel, &meta.ylabel)?;
                    }
                }
                Ok(())
            }
            PlotCommand::AddAxis {
                group,
                names,
                yscale,
                xlabel,
                ylabel,
            } => {
                if group > self.axes.len() {
                    return Err(LogError::Command(format!(
                        "axis {} declared before axis {}",
                        group,
                        self.axes.len()
                    )));
                }
                let meta = AxisMeta {
                    names,
                    yscale,
                    xlabel,
                    ylabel,
                };
                if group == self.axes.len() {
                    self.axes.push(meta);
                } else {
                    self.axes[group] = meta;
                }
                self.make_axes()
            }
            PlotCommand::Save { path } => self.active_surface()?.save(&path),
            PlotCommand::Continue => Ok(()),
            PlotCommand::Stop => {
                self.terminate();
                Ok(())
            }
        }
    }

    /// Release the surface and enter `Terminated`
    pub fn terminate(&mut self) {
        if self.state == LoopState::Terminated {
            return;
        }
        if let Some(mut surface) = self.surface.take() {
            surface.close();
        }
        self.state = LoopState::Terminated;
        self.current_group = None;
        tracing::info!("processed {} commands; plotter ended", self.total_processed);
    }

    fn make_axes(&mut self) -> Result<()> {
        let count = self.axes.len();
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| LogError::Command("surface already released".into()))?;
        surface.make_axes(count)?;
        self.state = LoopState::Active;
        if self.current_group.is_some_and(|ig| ig >= count) {
            self.current_group = None;
        }
        Ok(())
    }

    fn active_surface(&mut self) -> Result<&mut Box<dyn RenderSurface>> {
        active_surface(self.state, &mut self.surface)
    }
}

fn active_surface(
    state: LoopState,
    surface: &mut Option<Box<dyn RenderSurface>>,
) -> Result<&mut Box<dyn RenderSurface>> {
    match (state, surface.as_mut()) {
        (LoopState::Active, Some(surface)) => Ok(surface),
        (LoopState::Idle, _) => Err(LogError::Command("no axes have been declared".into())),
        _ => Err(LogError::Command("surface already released".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plotter::MockRenderSurface;
    use crossbeam_channel::unbounded;
    use mockall::predicate::*;
    use mockall::Sequence;

    fn meta(names: &[&str], yscale: YScale) -> AxisMeta {
        AxisMeta {
            names: names.iter().map(|s| s.to_string()).collect(),
            yscale,
            xlabel: "iteration".to_string(),
            ylabel: String::new(),
        }
    }

    /// A surface that accepts everything
    fn permissive_surface() -> MockRenderSurface {
        let mut surface = MockRenderSurface::new();
        surface.expect_make_axes().returning(|_| Ok(()));
        surface.expect_clear_all().returning(|| Ok(()));
        surface.expect_plot().returning(|_, _, _, _| Ok(()));
        surface.expect_set_legend().returning(|_, _| Ok(()));
        surface.expect_set_labels().returning(|_, _, _| Ok(()));
        surface.expect_save().returning(|_| Ok(()));
        surface.expect_draw().returning(|| Ok(()));
        surface.expect_close().return_const(());
        surface
    }

    fn active_loop(aggregate: usize) -> CommandLoop {
        CommandLoop::with_axes(
            Box::new(permissive_surface()),
            aggregate,
            vec![meta(&["a", "b"], YScale::Linear), meta(&["c"], YScale::Log)],
        )
        .unwrap()
    }

    fn burst(n_plots: usize) -> Vec<PlotCommand> {
        let mut cmds = vec![PlotCommand::Clear];
        for _ in 0..n_plots {
            cmds.push(PlotCommand::SetGroup { group: 0 });
            cmds.push(PlotCommand::Plot {
                xs: vec![0.0],
                ys: vec![1.0],
            });
        }
        cmds.push(PlotCommand::Legends);
        cmds.push(PlotCommand::Continue);
        cmds
    }

    #[test]
    fn test_idle_until_axes_declared() {
        let mut command_loop = CommandLoop::new(Box::new(permissive_surface()), 10);
        assert_eq!(command_loop.state(), LoopState::Idle);
        assert!(command_loop.apply(PlotCommand::Clear).is_err());

        command_loop
            .apply(PlotCommand::AddAxis {
                group: 0,
                names: vec!["r".into()],
                yscale: YScale::Log,
                xlabel: "iteration".into(),
                ylabel: String::new(),
            })
            .unwrap();
        assert_eq!(command_loop.state(), LoopState::Active);
        assert_eq!(command_loop.axes().len(), 1);
    }

    #[test]
    fn test_plot_goes_to_selected_group_with_its_scale() {
        let mut surface = MockRenderSurface::new();
        surface.expect_make_axes().with(eq(2)).times(1).returning(|_| Ok(()));
        surface
            .expect_plot()
            .withf(|axis, yscale, xs, ys| {
                *axis == 1
                    && *yscale == YScale::Log
                    && xs.to_vec() == vec![0.0, 1.0]
                    && ys.to_vec() == vec![5.0, 2.5]
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut command_loop = CommandLoop::with_axes(
            Box::new(surface),
            10,
            vec![meta(&["a"], YScale::Linear), meta(&["c"], YScale::Log)],
        )
        .unwrap();

        command_loop.apply(PlotCommand::SetGroup { group: 1 }).unwrap();
        assert_eq!(command_loop.current_group(), Some(1));
        command_loop
            .apply(PlotCommand::Plot {
                xs: vec![0.0, 1.0],
                ys: vec![5.0, 2.5],
            })
            .unwrap();
    }

    #[test]
    fn test_malformed_commands_are_rejected() {
        let mut command_loop = active_loop(10);
        assert!(command_loop
            .apply(PlotCommand::Plot {
                xs: vec![0.0],
                ys: vec![1.0]
            })
            .is_err());
        assert!(command_loop.apply(PlotCommand::SetGroup { group: 7 }).is_err());
        command_loop.apply(PlotCommand::SetGroup { group: 0 }).unwrap();
        assert!(command_loop
            .apply(PlotCommand::Plot {
                xs: vec![0.0, 1.0],
                ys: vec![1.0]
            })
            .is_err());
    }

    #[test]
    fn test_drain_skips_bad_command_and_continues() {
        let (tx, rx) = unbounded();
        tx.send(PlotCommand::SetGroup { group: 9 }).unwrap();
        tx.send(PlotCommand::Clear).unwrap();
        tx.send(PlotCommand::Continue).unwrap();

        let mut command_loop = active_loop(100);
        let report = command_loop.drain(&rx);
        assert_eq!(report.consumed, 3);
        assert_eq!(report.skipped, 1);
        assert!(report.redrawn);
        assert!(!report.terminated);
    }

    #[test]
    fn test_legends_apply_names_and_labels() {
        let mut surface = MockRenderSurface::new();
        let mut seq = Sequence::new();
        surface.expect_make_axes().returning(|_| Ok(()));
        surface
            .expect_set_legend()
            .withf(|axis, names| *axis == 0 && names.to_vec() == vec!["a".to_string(), "b".to_string()])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        surface
            .expect_set_labels()
            .withf(|axis, x, y| *axis == 0 && x.to_string() == "iteration" && y.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let mut command_loop =
            CommandLoop::with_axes(Box::new(surface), 10, vec![meta(&["a", "b"], YScale::Linear)])
                .unwrap();
        command_loop.apply(PlotCommand::Legends).unwrap();
    }

    #[test]
    fn test_add_axis_after_start_rebuilds_layout() {
        let mut surface = MockRenderSurface::new();
        let mut seq = Sequence::new();
        surface
            .expect_make_axes()
            .with(eq(1))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        surface
            .expect_make_axes()
            .with(eq(2))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut command_loop =
            CommandLoop::with_axes(Box::new(surface), 10, vec![meta(&["a"], YScale::Linear)])
                .unwrap();
        command_loop
            .apply(PlotCommand::AddAxis {
                group: 1,
                names: vec!["late".into()],
                yscale: YScale::Log,
                xlabel: String::new(),
                ylabel: "norm".into(),
            })
            .unwrap();
        assert_eq!(command_loop.axes()[1].ylabel, "norm");
        assert!(command_loop
            .apply(PlotCommand::AddAxis {
                group: 5,
                names: vec![],
                yscale: YScale::Linear,
                xlabel: String::new(),
                ylabel: String::new(),
            })
            .is_err());
    }

    #[test]
    fn test_drain_stops_at_continue_after_quota() {
        let (tx, rx) = unbounded();
        // Three bursts of 5 commands each
        for _ in 0..3 {
            for cmd in burst(1) {
                tx.send(cmd).unwrap();
            }
        }

        let mut command_loop = active_loop(6);
        let report = command_loop.drain(&rx);

        // First burst ends below the quota; the second burst's Continue
        // is the first boundary at or after it.
        assert_eq!(report.consumed, 10);
        assert_eq!(report.processed, 9);
        assert!(report.redrawn);
        assert_eq!(rx.len(), 5);

        let report = command_loop.drain(&rx);
        assert_eq!(report.consumed, 5);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_stop_terminates_without_redraw() {
        let mut surface = MockRenderSurface::new();
        surface.expect_make_axes().returning(|_| Ok(()));
        surface.expect_clear_all().times(1).returning(|| Ok(()));
        surface.expect_draw().never();
        surface.expect_close().times(1).return_const(());

        let mut command_loop =
            CommandLoop::with_axes(Box::new(surface), 1, vec![meta(&["a"], YScale::Linear)])
                .unwrap();

        let (tx, rx) = unbounded();
        tx.send(PlotCommand::Clear).unwrap();
        tx.send(PlotCommand::Stop).unwrap();
        tx.send(PlotCommand::Clear).unwrap();

        let report = command_loop.drain(&rx);
        assert!(report.terminated);
        assert_eq!(report.consumed, 2);
        assert_eq!(command_loop.state(), LoopState::Terminated);

        // Further ticks are no-ops
        let report = command_loop.drain(&rx);
        assert!(report.terminated);
        assert_eq!(report.consumed, 0);
    }

    #[test]
    fn test_disconnected_channel_terminates() {
        let (tx, rx) = unbounded();
        tx.send(PlotCommand::Clear).unwrap();
        drop(tx);

        let mut command_loop = active_loop(10);
        let report = command_loop.drain(&rx);
        assert!(report.terminated);
        assert!(report.redrawn);
        assert_eq!(command_loop.state(), LoopState::Terminated);
    }

    #[test]
    fn test_empty_channel_does_not_redraw() {
        let mut surface = MockRenderSurface::new();
        surface.expect_make_axes().returning(|_| Ok(()));
        surface.expect_draw().never();
        let mut command_loop =
            CommandLoop::with_axes(Box::new(surface), 10, vec![meta(&["a"], YScale::Linear)])
                .unwrap();

        let (_tx, rx) = unbounded::<PlotCommand>();
        let report = command_loop.drain(&rx);
        assert_eq!(report, DrainReport::default());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_drain_ends_on_burst_boundary(
            plots_per_burst in 0usize..6,
            bursts in 1usize..12,
            aggregate in 1usize..40,
        ) {
            let (tx, rx) = unbounded();
            let burst_len = burst(plots_per_burst).len();
            for _ in 0..bursts {
                for cmd in burst(plots_per_burst) {
                    tx.send(cmd).unwrap();
                }
            }

            let mut command_loop = active_loop(aggregate);
            let report = command_loop.drain(&rx);

            // Property: a tick never leaves a burst half-applied
            prop_assert_eq!(report.consumed % burst_len, 0);
            // Property: at most one burst is processed past the quota
            prop_assert!(report.consumed <= aggregate + burst_len);
            // Property: everything is drained when it fits in the quota
            if bursts * burst_len <= aggregate {
                prop_assert!(rx.is_empty());
            }
        }
    }
}
