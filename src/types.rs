//! Core data types for iterlog
//!
//! # Main Types
//!
//! - [`YScale`] - Y-axis scale of one group's subplot
//! - [`ChannelKey`] - Storage identity of a channel (name plus global position)
//! - [`LogValue`] - A value handed to `record()`: a scalar or a length-1 array

use crate::error::{LogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal index of a group (one subplot)
pub type GroupId = usize;

/// Default x-axis label for a group
pub const DEFAULT_XLABEL: &str = "iteration";

/// Y-axis scale mode of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum YScale {
    /// Linear axis (default)
    #[default]
    Linear,
    /// Logarithmic axis
    Log,
}

impl YScale {
    /// Name used on the wire and in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            YScale::Linear => "linear",
            YScale::Log => "log",
        }
    }
}

impl fmt::Display for YScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YScale {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(YScale::Linear),
            "log" => Ok(YScale::Log),
            other => Err(LogError::Config(format!("unknown y-scale '{}'", other))),
        }
    }
}

/// Identity of a stored channel.
///
/// Names are only unique together with the channel's position among all
/// channels, so two groups may both log a channel called `"residual"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    /// Display name (used in legends)
    pub name: String,
    /// Position among all channels of the logger
    pub index: usize,
}

impl ChannelKey {
    /// Create a key for `name` at global position `index`
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.index)
    }
}

/// A value passed to `Logger::record`.
///
/// Solvers often produce one-element arrays (e.g. a norm computed by a
/// vector routine). Those are unwrapped; longer arrays are rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    /// A plain scalar
    Scalar(f64),
    /// An array that must hold exactly one element
    Array(Vec<f64>),
}

impl LogValue {
    /// Unwrap to a scalar, failing with [`LogError::Shape`] for arrays whose
    /// length is not one
    pub fn to_scalar(&self) -> Result<f64> {
        match self {
            LogValue::Scalar(v) => Ok(*v),
            LogValue::Array(values) if values.len() == 1 => Ok(values[0]),
            LogValue::Array(values) => Err(LogError::Shape { len: values.len() }),
        }
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        LogValue::Scalar(value)
    }
}

impl From<f32> for LogValue {
    fn from(value: f32) -> Self {
        LogValue::Scalar(value as f64)
    }
}

impl From<i32> for LogValue {
    fn from(value: i32) -> Self {
        LogValue::Scalar(value as f64)
    }
}

impl From<u32> for LogValue {
    fn from(value: u32) -> Self {
        LogValue::Scalar(value as f64)
    }
}

impl From<Vec<f64>> for LogValue {
    fn from(values: Vec<f64>) -> Self {
        LogValue::Array(values)
    }
}

impl From<&[f64]> for LogValue {
    fn from(values: &[f64]) -> Self {
        LogValue::Array(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for LogValue {
    fn from(values: [f64; N]) -> Self {
        LogValue::Array(values.to_vec())
    }
}
