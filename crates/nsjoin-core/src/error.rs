//! Fatal helper errors.
//!
//! Every variant ends the helper process: the entry point prints the stage
//! and OS error code, then exits non-zero. Faults the helper tolerates
//! (short acknowledgement writes, command read errors, command failures)
//! are logged where they happen and never become an `NsenterError`.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::namespace::NamespaceKind;

/// One of the two synchronization channels shared with the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Helper → supervisor "joined" acknowledgement.
    Ack,
    /// Supervisor → helper command delivery.
    Command,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack => write!(f, "ack"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// A fatal failure of the namespace-join helper.
#[derive(Debug, Error)]
pub enum NsenterError {
    /// An environment variable is present but unusable.
    #[error("malformed {variable}: {value:?}")]
    ConfigMalformed {
        /// Name of the offending variable.
        variable: &'static str,
        /// Raw value found in the environment.
        value: String,
    },

    /// A namespace file could not be opened.
    #[error("open {kind} namespace {path} failed: {source}")]
    OpenNamespace {
        /// Namespace being joined.
        kind: NamespaceKind,
        /// Namespace file path.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// `setns(2)` rejected an open namespace handle.
    #[error("setns {kind} namespace {path} failed: {source}")]
    JoinNamespace {
        /// Namespace being joined.
        kind: NamespaceKind,
        /// Namespace file path.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A synchronization descriptor is missing, malformed, or not open.
    #[error("{channel} descriptor {fd} unusable: {source}")]
    Descriptor {
        /// Channel the descriptor belongs to.
        channel: Channel,
        /// Raw descriptor number (`-1` when unresolved).
        fd: i32,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The shell could not be started.
    #[error("spawn {shell} failed: {source}")]
    Exec {
        /// Shell binary that failed to start.
        shell: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },
}

impl NsenterError {
    /// Short name of the stage that failed, e.g. `setns pid`.
    #[must_use]
    pub fn stage(&self) -> String {
        match self {
            Self::ConfigMalformed { .. } => "config".to_owned(),
            Self::OpenNamespace { kind, .. } => format!("open {kind}"),
            Self::JoinNamespace { kind, .. } => format!("setns {kind}"),
            Self::Descriptor { channel, .. } => format!("{channel} channel"),
            Self::Exec { .. } => "exec".to_owned(),
        }
    }

    /// OS error code behind the failure, if there is one.
    #[must_use]
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::ConfigMalformed { .. } => None,
            Self::OpenNamespace { source, .. }
            | Self::JoinNamespace { source, .. }
            | Self::Descriptor { source, .. }
            | Self::Exec { source, .. } => source.raw_os_error(),
        }
    }
}
