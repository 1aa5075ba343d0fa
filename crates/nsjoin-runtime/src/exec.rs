//! Executing commands inside a running container's namespaces.
//!
//! The supervisor never joins namespaces itself. It re-executes the binary
//! as a helper whose very first action is the join, and coordinates with it
//! over two pipes:
//!
//! 1. the helper writes a 4-byte marker on the ack pipe once joined;
//! 2. the supervisor then writes the command on the command pipe;
//! 3. the helper runs the command and exits.

use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::process::Child;

use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl};
use nix::unistd::pipe2;
use nsjoin_common::constants::{
    ACK_MARKER_LEN, COMMAND_BUFFER_LEN, ENV_CONTAINER_CMD, ENV_CONTAINER_PID, ENV_PIPE_COMMAND,
    ENV_PIPE_PARENT, HELPER_SUBCOMMAND, SELF_EXE, ack_marker,
};
use nsjoin_common::error::{NsjoinError, Result};
use nsjoin_common::types::TargetPid;

/// How the helper is launched and fed.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Program started as the helper.
    pub helper: PathBuf,
    /// Arguments passed to the helper.
    pub helper_args: Vec<OsString>,
    /// Pass the command through `CONTAINER_CMD` instead of the command pipe.
    pub direct: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            helper: PathBuf::from(SELF_EXE),
            helper_args: vec![OsString::from(HELPER_SUBCOMMAND)],
            direct: false,
        }
    }
}

/// Result of a command executed through the helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutput {
    /// PID of the helper process.
    pub helper_pid: u32,
    /// Exit code of the helper (`-1` if it was killed by a signal).
    pub exit_code: i32,
}

/// Resolves a target given either as a numeric PID or a container name.
///
/// # Errors
///
/// Returns an error if `target` is a name whose record is missing or whose
/// container is not running.
pub fn resolve_target(state_dir: &Path, target: &str) -> Result<TargetPid> {
    if let Some(pid) = TargetPid::parse(target) {
        return Ok(pid);
    }
    crate::state::container_pid(state_dir, target)
}

/// Joins command words into the text sent to the helper.
///
/// # Errors
///
/// Returns an error if the command is empty, contains a NUL byte, or does
/// not fit the helper's command buffer.
pub fn command_text(command: &[String]) -> Result<String> {
    let text = command.join(" ");
    if text.trim().is_empty() {
        return Err(NsjoinError::Config {
            message: "exec command is empty".into(),
        });
    }
    if text.contains('\0') {
        return Err(NsjoinError::Config {
            message: "exec command contains a NUL byte".into(),
        });
    }
    if text.len() > COMMAND_BUFFER_LEN {
        return Err(NsjoinError::Config {
            message: format!(
                "exec command is {} bytes, limit is {COMMAND_BUFFER_LEN}",
                text.len()
            ),
        });
    }
    Ok(text)
}

/// Runs `command` inside the namespaces of `target` through a helper.
///
/// Blocks until the helper has joined, received the command and exited.
///
/// # Errors
///
/// Returns an error if the command is invalid, the pipes cannot be created,
/// the helper cannot be started, or the helper exits without acknowledging
/// or without reading the command. The helper is always reaped first.
pub fn exec_in_container(
    target: &TargetPid,
    command: &[String],
    options: &ExecOptions,
) -> Result<ExecOutput> {
    let text = command_text(command)?;
    tracing::info!(pid = %target, cmd = %text, direct = options.direct, "exec into container");

    let (ack_read, ack_write) = pipe()?;
    let (cmd_read, cmd_write) = pipe()?;
    inheritable(&ack_write)?;
    inheritable(&cmd_read)?;

    let mut helper = std::process::Command::new(&options.helper);
    let _ = helper
        .args(&options.helper_args)
        .env(ENV_CONTAINER_PID, target.as_str())
        .env(ENV_PIPE_PARENT, ack_write.as_raw_fd().to_string());
    if options.direct {
        let _ = helper
            .env(ENV_CONTAINER_CMD, &text)
            .env_remove(ENV_PIPE_COMMAND);
    } else {
        let _ = helper
            .env(ENV_PIPE_COMMAND, cmd_read.as_raw_fd().to_string())
            .env_remove(ENV_CONTAINER_CMD);
    }

    let mut child = helper.spawn().map_err(|e| NsjoinError::Io {
        path: options.helper.clone(),
        source: e,
    })?;
    tracing::debug!(helper_pid = child.id(), "helper started");

    // Only the helper may hold these ends, or EOF would never reach us.
    drop(ack_write);
    drop(cmd_read);

    if let Err(e) = wait_for_ack(File::from(ack_read)) {
        let code = reap(&mut child)?;
        tracing::error!(helper_pid = child.id(), code, "helper failed before acknowledging");
        return Err(NsjoinError::Handshake {
            message: format!("{e}; helper exit code {code}"),
        });
    }
    tracing::debug!("helper joined namespaces");

    let mut cmd_write = File::from(cmd_write);
    if !options.direct {
        if let Err(e) = cmd_write.write_all(text.as_bytes()) {
            drop(cmd_write);
            let code = reap(&mut child)?;
            tracing::error!(
                helper_pid = child.id(),
                code,
                error = %e,
                "helper did not take the command"
            );
            return Err(NsjoinError::Handshake {
                message: format!("writing command: {e}; helper exit code {code}"),
            });
        }
    }
    drop(cmd_write);

    let exit_code = reap(&mut child)?;
    tracing::info!(helper_pid = child.id(), exit_code, "helper finished");
    Ok(ExecOutput {
        helper_pid: child.id(),
        exit_code,
    })
}

fn pipe() -> Result<(OwnedFd, OwnedFd)> {
    pipe2(OFlag::O_CLOEXEC).map_err(|e| NsjoinError::Sys {
        operation: "pipe2",
        source: e.into(),
    })
}

fn inheritable(fd: &OwnedFd) -> Result<()> {
    let _ = fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty())).map_err(|e| NsjoinError::Sys {
        operation: "fcntl(F_SETFD)",
        source: e.into(),
    })?;
    Ok(())
}

fn wait_for_ack(mut ack: File) -> std::result::Result<(), String> {
    let mut marker = [0u8; ACK_MARKER_LEN];
    match ack.read_exact(&mut marker) {
        Ok(()) if marker == ack_marker() => Ok(()),
        Ok(()) => Err(format!("unexpected acknowledgement {marker:?}")),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err("helper closed the acknowledgement pipe".to_owned())
        }
        Err(e) => Err(format!("reading acknowledgement: {e}")),
    }
}

fn reap(child: &mut Child) -> Result<i32> {
    let status = child.wait().map_err(|source| NsjoinError::Sys {
        operation: "wait",
        source,
    })?;
    Ok(status.code().unwrap_or(-1))
}
