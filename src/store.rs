//! Series storage
//!
//! [`SeriesStore`] keeps, for every group, the ordered channel names, axis
//! metadata, and the x-series, plus one append-only value sequence per
//! channel. Channels are addressed by their [`ChannelKey`]: the name
//! together with the channel's position among all channels.
//!
//! Groups can only be added while nothing has been stored yet, so every
//! channel and every x-series always has the same length.

use crate::error::{LogError, Result};
use crate::types::{ChannelKey, GroupId, YScale};

/// Axis metadata and x-series of one group
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Channel names in legend order
    pub names: Vec<String>,
    /// Y-axis scale
    pub yscale: YScale,
    /// X-axis label
    pub xlabel: String,
    /// Y-axis label
    pub ylabel: String,
    /// Index of this group's first channel among all channels
    first_channel: usize,
    /// One x-coordinate per stored sample
    xs: Vec<f64>,
}

impl Group {
    /// Global channel indices belonging to this group
    pub fn channel_range(&self) -> std::ops::Range<usize> {
        self.first_channel..self.first_channel + self.names.len()
    }

    /// X-coordinates recorded so far
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }
}

/// One channel's stored values
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSeries {
    /// Storage key
    pub key: ChannelKey,
    /// Owning group
    pub group: GroupId,
    values: Vec<f64>,
}

impl ChannelSeries {
    /// Values recorded so far
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Most recent value
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Read-only view of one group, as sent to the live view
#[derive(Debug, Clone, Copy)]
pub struct GroupSnapshot<'a> {
    /// Group index
    pub group: GroupId,
    /// X-coordinates shared by all channels of the group
    pub xs: &'a [f64],
    /// Channels of the group in legend order
    pub series: &'a [ChannelSeries],
}

impl<'a> GroupSnapshot<'a> {
    /// Values of the first channel called `name`
    pub fn values(&self, name: &str) -> Option<&'a [f64]> {
        self.series
            .iter()
            .find(|s| s.key.name == name)
            .map(ChannelSeries::values)
    }
}

/// Append-only storage of all groups and channels
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    groups: Vec<Group>,
    channels: Vec<ChannelSeries>,
    samples: usize,
}

impl SeriesStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new group and allocate storage for its channels.
    ///
    /// Fails once any sample has been stored, because the record arity must
    /// be fixed before recording begins. A group without channels is
    /// allowed and only grows its x-series.
    pub fn add_group(
        &mut self,
        names: Vec<String>,
        yscale: YScale,
        xlabel: impl Into<String>,
        ylabel: impl Into<String>,
    ) -> Result<GroupId> {
        if self.samples > 0 {
            return Err(LogError::Config(format!(
                "cannot add a group after {} samples have been recorded",
                self.samples
            )));
        }
        let ig = self.groups.len();
        let first_channel = self.channels.len();
        for (offset, name) in names.iter().enumerate() {
            self.channels.push(ChannelSeries {
                key: ChannelKey::new(name.clone(), first_channel + offset),
                group: ig,
                values: Vec::new(),
            });
        }
        self.groups.push(Group {
            names,
            yscale,
            xlabel: xlabel.into(),
            ylabel: ylabel.into(),
            first_channel,
            xs: Vec::new(),
        });

        Ok(ig)
    }

    /// Append one sample to every channel of group `ig` plus one x-coordinate
    pub fn append(&mut self, ig: GroupId, values: &[f64], x: f64) -> Result<()> {
        let group = self
            .groups
            .get_mut(ig)
            .ok_or_else(|| LogError::Config(format!("unknown group {}", ig)))?;
        let range = group.channel_range();
        if values.len() != range.len() {
            return Err(LogError::Arity {
                expected: range.len(),
                got: values.len(),
            });
        }

        group.xs.push(x);
        for (channel, &value) in self.channels[range].iter_mut().zip(values) {
            channel.values.push(value);
        }
        // Every group grows once per record call.
        self.samples = self.samples.max(group.xs.len());
        Ok(())
    }

    /// Read-only view of group `ig`
    pub fn snapshot(&self, ig: GroupId) -> Option<GroupSnapshot<'_>> {
        let group = self.groups.get(ig)?;
        Some(GroupSnapshot {
            group: ig,
            xs: &group.xs,
            series: &self.channels[group.channel_range()],
        })
    }

    /// All groups in order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Group `ig`
    pub fn group(&self, ig: GroupId) -> Option<&Group> {
        self.groups.get(ig)
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of channels across all groups
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// All channels in global order
    pub fn channels(&self) -> &[ChannelSeries] {
        &self.channels
    }

    /// Channel stored under `key`
    pub fn channel(&self, key: &ChannelKey) -> Option<&ChannelSeries> {
        self.channels.get(key.index).filter(|c| c.key == *key)
    }

    /// Values of the first channel called `name` in group `ig`
    pub fn values(&self, ig: GroupId, name: &str) -> Option<&[f64]> {
        self.snapshot(ig).and_then(|s| s.values(name))
    }

    /// Number of samples stored per channel
    pub fn len(&self) -> usize {
        self.samples
    }

    /// Whether nothing has been stored yet
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Iterate `(group, channel index, name)` over all channels in order
    pub fn iter_names(&self) -> impl Iterator<Item = (GroupId, usize, &str)> + '_ {
        self.channels
            .iter()
            .map(|c| (c.group, c.key.index, c.key.name.as_str()))
    }
}
