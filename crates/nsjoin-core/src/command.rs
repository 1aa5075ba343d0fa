//! The command the helper runs once every namespace is joined.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::Read;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use nsjoin_common::constants::{
    COMMAND_BUFFER_LEN, ENV_CONTAINER_CMD, ENV_CONTAINER_PID, ENV_PIPE_COMMAND, ENV_PIPE_PARENT,
    EXIT_AFTER_COMMAND, SHELL_PATH,
};

use crate::error::NsenterError;

/// Shell command text held in a fixed-size buffer.
///
/// The text ends at the first NUL byte or at the filled length, whichever
/// comes first.
#[derive(Clone)]
pub struct CommandPayload {
    buf: [u8; COMMAND_BUFFER_LEN],
    len: usize,
}

impl CommandPayload {
    /// An empty payload.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            buf: [0; COMMAND_BUFFER_LEN],
            len: 0,
        }
    }

    /// Copies `text` into a payload, truncating it to the buffer size.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut payload = Self::empty();
        let len = text.len().min(COMMAND_BUFFER_LEN);
        payload.buf[..len].copy_from_slice(&text.as_bytes()[..len]);
        payload.len = len;
        payload
    }

    /// Fills a payload with a single `read` call.
    ///
    /// A short read is kept as-is; no attempt is made to fill the buffer.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying read.
    pub fn read_once(reader: &mut impl Read) -> std::io::Result<Self> {
        let mut payload = Self::empty();
        payload.len = reader.read(&mut payload.buf)?;
        Ok(payload)
    }

    /// Command bytes, without any trailing NUL padding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let filled = &self.buf[..self.len];
        filled
            .iter()
            .position(|b| *b == 0)
            .map_or(filled, |nul| &filled[..nul])
    }

    /// Command text for display.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Returns `true` if there is no command text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl Default for CommandPayload {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for CommandPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPayload")
            .field("text", &self.text())
            .finish()
    }
}

/// Variables that put a process into helper mode.
const HELPER_ENV: [&str; 4] = [
    ENV_CONTAINER_PID,
    ENV_PIPE_PARENT,
    ENV_PIPE_COMMAND,
    ENV_CONTAINER_CMD,
];

/// Runs command text through the shell.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    shell: PathBuf,
}

impl CommandExecutor {
    /// Executor using `/bin/sh`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_shell(SHELL_PATH)
    }

    /// Executor using a specific shell binary.
    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Builds `<shell> -c <text>`.
    ///
    /// The helper variables are removed from the child's environment: their
    /// descriptors are already closed, and a nested `nsjoin` must not mistake
    /// itself for a helper.
    fn shell_command(&self, payload: &CommandPayload) -> Command {
        let mut cmd = Command::new(&self.shell);
        let _ = cmd.arg("-c").arg(OsStr::from_bytes(payload.as_bytes()));
        for name in HELPER_ENV {
            let _ = cmd.env_remove(name);
        }
        cmd
    }

    /// Executes arbitrary shell text as `<shell> -c <text>` and waits for it.
    ///
    /// The text is not parsed or sanitized; the supervisor that sent it is
    /// trusted. The child inherits namespaces and descriptors, and the
    /// environment minus the helper variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    pub fn run_shell(&self, payload: &CommandPayload) -> Result<ExitStatus, NsenterError> {
        self.shell_command(payload)
            .status()
            .map_err(|source| NsenterError::Exec {
                shell: self.shell.clone(),
                source,
            })
    }

    /// Runs the payload and returns the helper's exit status.
    ///
    /// The helper exits with [`EXIT_AFTER_COMMAND`] whether the command
    /// succeeded, failed, or could not be started at all.
    pub fn execute(&self, payload: &CommandPayload) -> i32 {
        if payload.is_empty() {
            tracing::warn!("empty command payload");
        }
        tracing::info!(command = %payload.text(), "executing command");

        match self.run_shell(payload) {
            Ok(status) if status.success() => tracing::debug!("command finished"),
            Ok(status) => tracing::warn!(code = ?status.code(), "command exited unsuccessfully"),
            Err(e) => tracing::warn!(error = %e, "command could not be started"),
        }
        EXIT_AFTER_COMMAND
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}
