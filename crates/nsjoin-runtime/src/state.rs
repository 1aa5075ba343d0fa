//! Container state records.
//!
//! The runtime that owns a container keeps one JSON record per container at
//! `<state_dir>/<name>/config.json`. Only the fields needed to find the
//! container's init process are read here.

use std::path::{Path, PathBuf};

use nsjoin_common::constants::STATE_FILE_NAME;
use nsjoin_common::error::{NsjoinError, Result};
use nsjoin_common::types::{ContainerStatus, TargetPid};
use serde::Deserialize;

/// Process state of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessState {
    /// Whether the container's init process is running.
    #[serde(default)]
    pub running: bool,
    /// PID of the init process on the host.
    #[serde(default)]
    pub pid: i64,
}

/// Persistent record of a container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerRecord {
    /// Container identifier.
    #[serde(rename = "ID", default)]
    pub id: String,
    /// Human-readable container name.
    pub name: String,
    /// Process state.
    pub state: ProcessState,
}

impl ContainerRecord {
    /// Lifecycle status derived from the process state.
    #[must_use]
    pub const fn status(&self) -> ContainerStatus {
        if self.state.running {
            ContainerStatus::Running
        } else if self.state.pid > 0 {
            ContainerStatus::Exited
        } else {
            ContainerStatus::Created
        }
    }
}

/// Returns the record path for a container.
#[must_use]
pub fn record_path(state_dir: &Path, name: &str) -> PathBuf {
    state_dir.join(name).join(STATE_FILE_NAME)
}

/// Loads a container record from disk.
///
/// # Errors
///
/// Returns an error if the record does not exist or cannot be parsed.
pub fn load_record(state_dir: &Path, name: &str) -> Result<ContainerRecord> {
    let path = record_path(state_dir, name);
    tracing::debug!(path = %path.display(), "loading container record");
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(NsjoinError::NotFound {
                kind: "container",
                id: name.to_owned(),
            });
        }
        Err(e) => return Err(NsjoinError::Io { path, source: e }),
    };
    Ok(serde_json::from_str(&content)?)
}

/// Returns the PID of a running container's init process.
///
/// # Errors
///
/// Returns an error if the record is missing or unreadable, or if the
/// container is not running.
pub fn container_pid(state_dir: &Path, name: &str) -> Result<TargetPid> {
    let record = load_record(state_dir, name)?;
    let status = record.status();
    match u32::try_from(record.state.pid) {
        Ok(pid) if status == ContainerStatus::Running && pid > 0 => Ok(TargetPid::from(pid)),
        _ => Err(NsjoinError::Config {
            message: format!("container {name} is not running (status: {status})"),
        }),
    }
}
