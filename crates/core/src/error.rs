//! Error types shared across the workspace

use thiserror::Error;

/// Errors surfaced by the session and transport layers
#[derive(Error, Debug)]
pub enum Error {
    /// Ephemeral credential exchange failed (HTTP error, error field in the
    /// response body, or missing data field)
    #[error("Credential error: {0}")]
    Credential(String),

    /// Transport connect was rejected. Terminal for the session instance;
    /// connects are never retried automatically.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A send on a live transport failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Operation requires a connected transport
    #[error("Transport is not connected")]
    NotConnected,

    /// Tool execution failed at or past the schema boundary
    #[error("Tool error: {0}")]
    Tool(String),

    /// Key-value settings store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
