//! Unified error types for the nsjoin workspace.
//!
//! The helper core defines its own fatal-stage error; this type covers the
//! supervisor side and container state lookup.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum NsjoinError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A system call failed.
    #[error("{operation} failed: {source}")]
    Sys {
        /// Name of the failed operation.
        operation: &'static str,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The helper did not complete the synchronization handshake.
    #[error("handshake with helper failed: {message}")]
    Handshake {
        /// Description of what went wrong.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, NsjoinError>;
