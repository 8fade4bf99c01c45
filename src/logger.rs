//! Producer-facing logger
//!
//! A [`Logger`] records one sample per channel per call and, when live
//! plotting is enabled, keeps a plotter thread up to date by sending it a
//! full burst of [`PlotCommand`]s after every call. Recording never waits
//! for the plotter; only [`Logger::terminate`] waits, and only for a
//! bounded time.
//!
//! # Example
//!
//! ```
//! use iterlog::{LogConfig, Logger};
//!
//! let mut log = Logger::new(
//!     vec![vec!["residual", "error"], vec!["step"]],
//!     LogConfig::default().with_plot(false),
//! )
//! .unwrap();
//!
//! for it in 0..3 {
//!     let r = 1.0 / (it as f64 + 1.0);
//!     log.record([r, r * 0.5, 0.1]).unwrap();
//! }
//! assert_eq!(log.store().values(0, "residual").unwrap().len(), 3);
//! ```

use crate::config::LogConfig;
use crate::error::{LogError, Result};
use crate::plotter::{AxisMeta, Figure, LiveView, LiveViewState, RenderSurface, SurfaceFactory};
use crate::protocol::{add_axis_command, plot_burst, PlotCommand};
use crate::store::SeriesStore;
use crate::types::{GroupId, LogValue, YScale};
use std::path::PathBuf;

/// Keyword options of a record call.
///
/// Any option being present changes how an arity mismatch is handled:
/// without options it is an [`LogError::Arity`] error, with options the
/// call is silently ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordOptions {
    /// Per-group x-coordinates; `None` entries fall back to the call counter
    pub x: Option<Vec<Option<f64>>>,
    /// Terminate the live view instead of recording
    pub finished: Option<bool>,
    /// Ask the live view to save the figure before this call's effects
    pub save_figure: Option<PathBuf>,
}

impl RecordOptions {
    /// No options
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit x-coordinate for every group
    pub fn with_x(mut self, xs: impl IntoIterator<Item = f64>) -> Self {
        self.x = Some(xs.into_iter().map(Some).collect());
        self
    }

    /// Per-group x-coordinates, some of which may fall back to the call counter
    pub fn with_partial_x(mut self, xs: Vec<Option<f64>>) -> Self {
        self.x = Some(xs);
        self
    }

    /// Set the `finished` flag
    pub fn with_finished(mut self, finished: bool) -> Self {
        self.finished = Some(finished);
        self
    }

    /// Save the figure to `path`
    pub fn with_save_figure(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_figure = Some(path.into());
        self
    }

    /// Whether no option was given
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.finished.is_none() && self.save_figure.is_none()
    }

    fn x_for(&self, ig: GroupId) -> Option<f64> {
        self.x.as_ref().and_then(|xs| xs.get(ig).copied().flatten())
    }
}

/// What a record call did
#[derive(Debug)]
pub enum RecordOutcome {
    /// Values stored and, if plotting, sent to the live view
    Recorded,
    /// Values stored, but the live view could not be updated
    Degraded(LogError),
    /// Arity mismatch with options present: nothing stored
    Ignored,
    /// `finished` was set: the live view was terminated
    Terminated,
}

impl RecordOutcome {
    /// Whether values were stored
    pub fn is_recorded(&self) -> bool {
        matches!(self, RecordOutcome::Recorded | RecordOutcome::Degraded(_))
    }
}

/// What [`Logger::add_group`] did
#[derive(Debug)]
pub enum GroupOutcome {
    /// Group added and, if the live view is running, announced to it
    Added(GroupId),
    /// Group added, but the running live view could not be told about it
    Degraded(GroupId, LogError),
}

impl GroupOutcome {
    /// Index of the new group
    pub fn group(&self) -> GroupId {
        match self {
            GroupOutcome::Added(ig) | GroupOutcome::Degraded(ig, _) => *ig,
        }
    }
}

/// Records scalar series grouped into subplots and streams them to a live view
pub struct Logger {
    store: SeriesStore,
    config: LogConfig,
    call_count: u64,
    live_view: LiveView,
    surface_factory: Option<SurfaceFactory>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("call_count", &self.call_count)
            .field("live_view", &self.live_view.state())
            .field("has_backend", &self.surface_factory.is_some())
            .finish()
    }
}

impl Logger {
    /// Create a logger plotting into a headless [`Figure`].
    ///
    /// `groups` holds the channel names of each subplot, e.g.
    /// `[["a", "b"], ["c"]]` for two subplots with three channels in total.
    pub fn new<G, N, S>(groups: G, config: LogConfig) -> Result<Self>
    where
        G: IntoIterator<Item = N>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_surface(groups, config, || Box::new(Figure::new()) as Box<dyn RenderSurface>)
    }

    /// Create a logger whose live view draws on the surface built by `factory`.
    ///
    /// The factory runs on the plotter thread when the live view starts.
    pub fn with_surface<G, N, S, F>(groups: G, config: LogConfig, factory: F) -> Result<Self>
    where
        G: IntoIterator<Item = N>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce() -> Box<dyn RenderSurface> + Send + 'static,
    {
        Self::build(groups, config, Some(Box::new(factory)))
    }

    /// Create a logger without any render backend; live plotting is disabled
    pub fn without_backend<G, N, S>(groups: G, config: LogConfig) -> Result<Self>
    where
        G: IntoIterator<Item = N>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(groups, config, None)
    }

    fn build<G, N, S>(groups: G, config: LogConfig, factory: Option<SurfaceFactory>) -> Result<Self>
    where
        G: IntoIterator<Item = N>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let groups: Vec<Vec<String>> = groups
            .into_iter()
            .map(|names| names.into_iter().map(Into::into).collect())
            .collect();
        config.validate(groups.len())?;

        let mut store = SeriesStore::new();
        for (ig, names) in groups.into_iter().enumerate() {
            store.add_group(names, config.yscale(ig), config.xlabel(ig), config.ylabel(ig))?;
        }

        if config.is_plot && factory.is_none() {
            tracing::warn!("log plot is disabled: no render backend available");
        }

        Ok(Self {
            store,
            live_view: LiveView::new(config.live_view.clone()),
            config,
            call_count: 0,
            surface_factory: factory,
        })
    }

    /// Add a group before recording starts.
    ///
    /// If the live view is already running, it is told to add an axis; a
    /// failed send is reported as [`GroupOutcome::Degraded`].
    pub fn add_group<S: Into<String>>(
        &mut self,
        names: impl IntoIterator<Item = S>,
        yscale: YScale,
        xlabel: impl Into<String>,
        ylabel: impl Into<String>,
    ) -> Result<GroupOutcome> {
        let names = names.into_iter().map(Into::into).collect();
        let ig = self.store.add_group(names, yscale, xlabel, ylabel)?;

        if self.live_view.is_running() {
            if let Some(command) = add_axis_command(&self.store, ig) {
                if let Err(e) = self.live_view.send(command) {
                    tracing::warn!("could not announce group {} to the live view: {}", ig, e);
                    return Ok(GroupOutcome::Degraded(ig, e));
                }
            }
        }
        Ok(GroupOutcome::Added(ig))
    }

    /// Record one value per channel, in channel order
    pub fn record<I>(&mut self, values: I) -> Result<RecordOutcome>
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        self.record_with(values, RecordOptions::default())
    }

    /// Record with keyword options.
    ///
    /// Order of effects: `save_figure` is forwarded first, then `finished`
    /// terminates the live view, then arity is checked, values are stored
    /// and a plot burst is sent.
    pub fn record_with<I>(&mut self, values: I, options: RecordOptions) -> Result<RecordOutcome>
    where
        I: IntoIterator,
        I::Item: Into<LogValue>,
    {
        let mut transport_error = None;

        if let Some(path) = &options.save_figure {
            if self.live_view.is_running() {
                if let Err(e) = self.live_view.send(PlotCommand::save(path)) {
                    tracing::warn!("could not request figure save: {}", e);
                    transport_error = Some(e);
                }
            }
        }

        if options.finished == Some(true) {
            self.terminate()?;
            return Ok(RecordOutcome::Terminated);
        }

        let values: Vec<LogValue> = values.into_iter().map(Into::into).collect();
        let expected = self.store.channel_count();
        if values.len() != expected {
            if !options.is_empty() {
                tracing::debug!(
                    "ignoring record call with {} values ({} expected)",
                    values.len(),
                    expected
                );
                return Ok(RecordOutcome::Ignored);
            }
            return Err(LogError::Arity {
                expected,
                got: values.len(),
            });
        }

        let scalars = values
            .iter()
            .map(LogValue::to_scalar)
            .collect::<Result<Vec<f64>>>()?;

        for ig in 0..self.store.group_count() {
            let range = match self.store.group(ig) {
                Some(group) => group.channel_range(),
                None => continue,
            };
            let x = options.x_for(ig).unwrap_or(self.call_count as f64);
            self.store.append(ig, &scalars[range], x)?;
        }

        if self.config.is_plot
            && self.surface_factory.is_some()
            && self.live_view.state() == LiveViewState::NotStarted
        {
            if let Err(e) = self.start_live_view() {
                tracing::warn!("live plot could not be started: {}", e);
                transport_error = Some(e);
            }
        }

        if self.live_view.is_running() {
            if let Err(e) = self.live_view.send_all(plot_burst(&self.store)) {
                tracing::warn!("plot update dropped: {}", e);
                transport_error = Some(e);
            }
        }

        self.call_count += 1;
        Ok(match transport_error {
            Some(e) => RecordOutcome::Degraded(e),
            None => RecordOutcome::Recorded,
        })
    }

    /// Shortcut for a record call with `finished = true`
    pub fn finish(&mut self) -> Result<RecordOutcome> {
        self.record_with(Vec::<f64>::new(), RecordOptions::new().with_finished(true))
    }

    /// Start the live view now instead of on the first record call.
    ///
    /// Has no effect once the live view has been started or terminated.
    pub fn start_live_view(&mut self) -> Result<()> {
        if self.live_view.state() != LiveViewState::NotStarted {
            return Ok(());
        }
        let factory = self
            .surface_factory
            .take()
            .ok_or_else(|| LogError::Config("no render backend available".to_string()))?;
        self.live_view
            .start(factory, self.config.aggregate, self.axis_layout())
    }

    /// Stop the live view, waiting a bounded time for it to shut down, and
    /// reset the call counter.
    ///
    /// Without a running live view this is a no-op, so the fallback
    /// x-series of an offline logger keeps counting up.
    pub fn terminate(&mut self) -> Result<()> {
        if !self.live_view.is_running() {
            return Ok(());
        }
        self.call_count = 0;
        let result = self.live_view.terminate();
        tracing::info!("terminated");
        result.map(|_| ())
    }

    /// Successful record calls since creation or since a running live view
    /// was terminated
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// The recorded series
    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// Logger options
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Number of values expected by [`Logger::record`]
    pub fn channel_count(&self) -> usize {
        self.store.channel_count()
    }

    /// Lifecycle state of the live view
    pub fn live_view_state(&self) -> LiveViewState {
        self.live_view.state()
    }

    /// Iterate `(group, channel index, name)` over all channels in order
    pub fn iter_names(&self) -> impl Iterator<Item = (GroupId, usize, &str)> + '_ {
        self.store.iter_names()
    }

    fn axis_layout(&self) -> Vec<AxisMeta> {
        self.store
            .groups()
            .iter()
            .map(|group| AxisMeta {
                names: group.names.clone(),
                yscale: group.yscale,
                xlabel: group.xlabel.clone(),
                ylabel: group.ylabel.clone(),
            })
            .collect()
    }
}
