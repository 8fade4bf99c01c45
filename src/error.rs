//! Error handling for iterlog
//!
//! This module defines the error type shared by the producer side (logger,
//! series store) and the consumer side (command loop, render surfaces),
//! plus a Result alias and a context extension trait.

use thiserror::Error;

/// Main error type for iterlog operations
#[derive(Error, Debug)]
pub enum LogError {
    /// `record()` was called with the wrong number of values
    #[error("log called with wrong number of arguments! ({got} == {expected})")]
    Arity { expected: usize, got: usize },

    /// Invalid group/channel configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A logged value was an array with more (or fewer) than one element
    #[error("can log only scalars (got an array of length {len})")]
    Shape { len: usize },

    /// The channel to the live view could not deliver a command
    #[error("Transport error: {0}")]
    Transport(String),

    /// The consumer could not apply a command
    #[error("Command error: {0}")]
    Command(String),

    /// Timeout errors
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<LogError>,
    },
}

impl LogError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        LogError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &LogError {
        match self {
            LogError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        LogError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LogError {
    fn from(err: toml::de::Error) -> Self {
        LogError::Config(err.to_string())
    }
}

/// Result type alias for iterlog operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| LogError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| LogError::Io(e).with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_error_display() {
        let err = LogError::Arity {
            expected: 3,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "log called with wrong number of arguments! (2 == 3)"
        );
    }

    #[test]
    fn test_error_with_context() {
        let err = LogError::Transport("disconnected".to_string());
        let with_ctx = err.with_context("Failed to send plot burst");
        assert!(with_ctx.to_string().contains("Failed to send plot burst"));
        assert!(matches!(with_ctx.root(), LogError::Transport(_)));
    }

    #[test]
    fn test_io_result_context() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = res.context("saving figure").unwrap_err();
        assert!(err.to_string().starts_with("saving figure"));
        assert!(matches!(err.root(), LogError::Io(_)));
    }

    #[test]
    fn test_shape_error_display() {
        let err = LogError::Shape { len: 3 };
        assert!(err.to_string().contains("length 3"));
    }
}
