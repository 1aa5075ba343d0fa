//! System-wide constants and the helper environment contract.

/// Environment variable holding the target process identifier.
///
/// Its absence means the process was not launched as a namespace-join helper.
pub const ENV_CONTAINER_PID: &str = "CONTAINER_PID";

/// Environment variable holding the acknowledgement descriptor (helper → supervisor).
pub const ENV_PIPE_PARENT: &str = "CONTAINER_PIPE_PARENT";

/// Environment variable holding the command descriptor (supervisor → helper).
pub const ENV_PIPE_COMMAND: &str = "CONTAINER_PIPE_COMMAND";

/// Environment variable holding a command for direct mode (no command channel).
pub const ENV_CONTAINER_CMD: &str = "CONTAINER_CMD";

/// Environment variable overriding the container state directory.
pub const ENV_STATE_DIR: &str = "NSJOIN_STATE_DIR";

/// Root of the procfs mount used to resolve namespace files.
pub const PROC_ROOT: &str = "/proc";

/// Acknowledgement value written once all namespaces are joined.
pub const SYNC_SETNS_ACK: i32 = 0x40;

/// Size in bytes of the acknowledgement marker on the wire.
pub const ACK_MARKER_LEN: usize = std::mem::size_of::<i32>();

/// Capacity of the helper's command buffer.
pub const COMMAND_BUFFER_LEN: usize = 1024;

/// Exit status of the helper after the command ran, whatever its result.
pub const EXIT_AFTER_COMMAND: i32 = 0;

/// Exit status of the helper on any fatal failure.
pub const EXIT_FATAL: i32 = 1;

/// Shell used to run command text.
pub const SHELL_PATH: &str = "/bin/sh";

/// Default directory holding per-container state records.
pub const DEFAULT_STATE_DIR: &str = "/var/run/nsjoin";

/// File name of a container's state record inside its directory.
pub const STATE_FILE_NAME: &str = "config.json";

/// Path the supervisor re-executes to become the helper.
pub const SELF_EXE: &str = "/proc/self/exe";

/// Subcommand passed to the re-executed helper.
pub const HELPER_SUBCOMMAND: &str = "exec";

/// Application name used in diagnostics.
pub const APP_NAME: &str = "nsjoin";

/// Returns the acknowledgement marker bytes.
#[must_use]
pub const fn ack_marker() -> [u8; ACK_MARKER_LEN] {
    SYNC_SETNS_ACK.to_ne_bytes()
}
