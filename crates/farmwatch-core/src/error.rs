//! Error types for the Farmwatch client
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for Farmwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the Farmwatch client
#[derive(Error, Debug)]
pub enum Error {
    /// Request could not be completed (timeout, connection refused, bad URL)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Device answered with a non-2xx status
    #[error("HTTP error: status {status}")]
    Http {
        /// Status code returned by the device
        status: u16,
    },

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Live feed connection errors
    #[error("Feed error: {0}")]
    Feed(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16) -> Self {
        Self::Http { status }
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a feed error
    pub fn feed(msg: impl Into<String>) -> Self {
        Self::Feed(msg.into())
    }

    /// Whether this error came from talking to the device
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
