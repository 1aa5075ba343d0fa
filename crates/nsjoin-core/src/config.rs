//! Environment contract between the supervisor and the helper.
//!
//! The environment is read exactly once, here. Later stages receive a
//! [`JoinConfig`] and never look at the environment themselves.

use nsjoin_common::constants::{
    ENV_CONTAINER_CMD, ENV_CONTAINER_PID, ENV_PIPE_COMMAND, ENV_PIPE_PARENT,
};
use nsjoin_common::types::{PipeDescriptor, TargetPid};

use crate::error::NsenterError;

/// Where the helper gets the command it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSource {
    /// Read from the command pipe after acknowledging the supervisor.
    Channel(PipeDescriptor),
    /// Taken verbatim from `CONTAINER_CMD`; no command pipe is involved.
    Direct(String),
}

/// Everything the helper needs, resolved before any namespace is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinConfig {
    /// Process whose namespaces are joined.
    pub target: TargetPid,
    /// Acknowledgement descriptor (helper → supervisor).
    pub ack: PipeDescriptor,
    /// Command origin.
    pub command: CommandSource,
}

/// Resolves the helper configuration from the process environment.
///
/// Returns `Ok(None)` when `CONTAINER_PID` is absent or empty: the process
/// was not started as a helper and should carry on normally.
///
/// # Errors
///
/// Returns an error if `CONTAINER_PID` is set but is not a decimal number.
pub fn resolve() -> Result<Option<JoinConfig>, NsenterError> {
    resolve_from(|name| {
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    })
}

/// Resolves the helper configuration through an arbitrary variable lookup.
///
/// # Errors
///
/// Returns an error if the target PID variable is set but malformed.
pub fn resolve_from<F>(lookup: F) -> Result<Option<JoinConfig>, NsenterError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw_pid) = lookup(ENV_CONTAINER_PID).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let target = TargetPid::parse(&raw_pid).ok_or_else(|| NsenterError::ConfigMalformed {
        variable: ENV_CONTAINER_PID,
        value: raw_pid.clone(),
    })?;

    let ack = PipeDescriptor::parse(lookup(ENV_PIPE_PARENT).as_deref());
    let command_fd = PipeDescriptor::parse(lookup(ENV_PIPE_COMMAND).as_deref());

    let command = match lookup(ENV_CONTAINER_CMD).filter(|c| !c.is_empty()) {
        Some(text) if !command_fd.is_valid() => CommandSource::Direct(text),
        _ => CommandSource::Channel(command_fd),
    };

    tracing::debug!(
        pid = %target,
        ack = %ack,
        command = ?command,
        "resolved helper configuration"
    );
    Ok(Some(JoinConfig {
        target,
        ack,
        command,
    }))
}
