//! Consumer thread lifecycle
//!
//! [`LiveView`] is owned by the logger. It spawns the plotter thread on
//! demand, forwards commands to it without ever blocking the producer, and
//! stops it with a bounded wait:
//!
//! ```text
//! NotStarted ──start──▶ Running ──terminate / consumer gone──▶ Terminated
//! ```
//!
//! Starting is one-shot: once terminated, a live view stays terminated.
//! Dropping a running `LiveView` terminates it.

use crate::config::LiveViewSettings;
use crate::error::{LogError, Result};
use crate::plotter::{AxisMeta, CommandLoop, RenderSurface};
use crate::protocol::PlotCommand;
use crossbeam_channel::{
    bounded, unbounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError,
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Builds the render surface on the plotter thread
pub type SurfaceFactory = Box<dyn FnOnce() -> Box<dyn RenderSurface> + Send>;

/// Lifecycle of a [`LiveView`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiveViewState {
    #[default]
    NotStarted,
    Running,
    Terminated,
}

/// Acknowledgement sent by the plotter thread when it exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotterExit {
    /// Commands processed over the plotter's lifetime
    pub processed: u64,
}

/// The plotter thread body
struct PlotterWorker {
    command_rx: Receiver<PlotCommand>,
    exit_tx: Sender<PlotterExit>,
    poll_interval: Duration,
    aggregate: usize,
    axes: Vec<AxisMeta>,
}

impl PlotterWorker {
    fn run(self, factory: SurfaceFactory) {
        tracing::info!("starting plotter...");
        let surface = factory();
        let mut command_loop = match CommandLoop::with_axes(surface, self.aggregate, self.axes) {
            Ok(command_loop) => command_loop,
            Err(e) => {
                tracing::error!("failed to set up plot surface: {}", e);
                let _ = self.exit_tx.send(PlotterExit { processed: 0 });
                return;
            }
        };
        tracing::info!("...done");

        loop {
            let report = command_loop.drain(&self.command_rx);
            if report.terminated {
                break;
            }
            std::thread::sleep(self.poll_interval);
        }

        let _ = self.exit_tx.send(PlotterExit {
            processed: command_loop.total_processed(),
        });
        tracing::info!("ended.");
    }
}

/// Producer-side handle of the plotter thread
#[derive(Debug)]
pub struct LiveView {
    state: LiveViewState,
    settings: LiveViewSettings,
    command_tx: Option<Sender<PlotCommand>>,
    exit_rx: Option<Receiver<PlotterExit>>,
    handle: Option<JoinHandle<()>>,
}

impl LiveView {
    /// Create a handle in `NotStarted` state
    pub fn new(settings: LiveViewSettings) -> Self {
        Self {
            state: LiveViewState::NotStarted,
            settings,
            command_tx: None,
            exit_rx: None,
            handle: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LiveViewState {
        self.state
    }

    /// Whether commands are currently forwarded
    pub fn is_running(&self) -> bool {
        self.state == LiveViewState::Running
    }

    /// Spawn the plotter thread with one axis per entry of `axes`.
    ///
    /// Does nothing unless the view is `NotStarted`.
    pub fn start(
        &mut self,
        factory: SurfaceFactory,
        aggregate: usize,
        axes: Vec<AxisMeta>,
    ) -> Result<()> {
        if self.state != LiveViewState::NotStarted {
            return Ok(());
        }

        let (command_tx, command_rx) = match self.settings.channel_capacity {
            Some(capacity) => bounded(capacity),
            None => unbounded(),
        };
        let (exit_tx, exit_rx) = bounded(1);
        let worker = PlotterWorker {
            command_rx,
            exit_tx,
            poll_interval: self.settings.poll_interval(),
            aggregate,
            axes,
        };

        let handle = std::thread::Builder::new()
            .name("iterlog-plotter".to_string())
            .spawn(move || worker.run(factory))
            .map_err(|e| {
                self.state = LiveViewState::Terminated;
                LogError::Io(e).with_context("spawning plotter thread")
            })?;

        self.command_tx = Some(command_tx);
        self.exit_rx = Some(exit_rx);
        self.handle = Some(handle);
        self.state = LiveViewState::Running;
        Ok(())
    }

    /// Queue one command without blocking.
    ///
    /// A full bounded channel drops the command; a vanished consumer moves
    /// the view to `Terminated`. Both are reported as transport errors.
    pub fn send(&mut self, command: PlotCommand) -> Result<()> {
        let Some(tx) = self.command_tx.as_ref() else {
            return Err(LogError::Transport("live view is not running".to_string()));
        };
        match tx.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(command)) => Err(LogError::Transport(format!(
                "command channel full, dropped {} command",
                command.name()
            ))),
            Err(TrySendError::Disconnected(_)) => {
                self.detach();
                Err(LogError::Transport("plotter has exited".to_string()))
            }
        }
    }

    /// Queue a burst of commands as a unit.
    ///
    /// On a bounded channel without room for the whole burst nothing is
    /// queued, so the plotter never sees a burst without its `Continue`.
    pub fn send_all(&mut self, commands: impl IntoIterator<Item = PlotCommand>) -> Result<usize> {
        let commands: Vec<PlotCommand> = commands.into_iter().collect();
        if let Some(tx) = self.command_tx.as_ref() {
            // Only this handle sends, so free space can only grow meanwhile.
            if let Some(capacity) = tx.capacity() {
                let free = capacity.saturating_sub(tx.len());
                if free < commands.len() {
                    return Err(LogError::Transport(format!(
                        "command channel full, dropped burst of {} commands ({} free)",
                        commands.len(),
                        free
                    )));
                }
            }
        }

        let mut sent = 0;
        for command in commands {
            self.send(command)?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Send `Stop` and wait for the plotter to acknowledge, at most for the
    /// configured shutdown timeout.
    ///
    /// Returns `Ok(None)` if the view was not running.
    pub fn terminate(&mut self) -> Result<Option<PlotterExit>> {
        if self.state != LiveViewState::Running {
            return Ok(None);
        }
        self.state = LiveViewState::Terminated;
        let timeout = self.settings.shutdown_timeout();
        let deadline = Instant::now() + timeout;

        if let Some(tx) = self.command_tx.take() {
            match tx.send_deadline(PlotCommand::Stop, deadline) {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(_)) => {
                    tracing::warn!(
                        "could not queue stop within {:?}; detaching plotter",
                        timeout
                    );
                    self.exit_rx = None;
                    self.handle = None;
                    return Err(LogError::Timeout(format!(
                        "plotter stop not queued within {:?}",
                        timeout
                    )));
                }
                // The consumer is gone already; its ack may still be pending.
                Err(SendTimeoutError::Disconnected(_)) => {}
            }
        }

        let Some(exit_rx) = self.exit_rx.take() else {
            return Ok(None);
        };
        match exit_rx.recv_deadline(deadline) {
            Ok(exit) => {
                if let Some(handle) = self.handle.take() {
                    if handle.join().is_err() {
                        tracing::warn!("plotter thread panicked after acknowledging stop");
                    }
                }
                Ok(Some(exit))
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "plotter did not acknowledge stop within {:?}; detaching it",
                    timeout
                );
                self.handle = None;
                Err(LogError::Timeout(format!(
                    "plotter shutdown not acknowledged within {:?}",
                    timeout
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let panicked = self.handle.take().map(|h| h.join().is_err()).unwrap_or(false);
                if panicked {
                    tracing::warn!("plotter thread panicked");
                }
                Err(LogError::Transport("plotter exited without acknowledging stop".to_string()))
            }
        }
    }

    fn detach(&mut self) {
        tracing::warn!("plotter has exited; continuing without live plotting");
        self.state = LiveViewState::Terminated;
        self.command_tx = None;
        self.exit_rx = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            tracing::warn!("live view shutdown on drop: {}", e);
        }
    }
}
