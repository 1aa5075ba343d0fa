//! `nsjoin exec` — Execute a command inside a running container.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use nsjoin_common::constants::{DEFAULT_STATE_DIR, ENV_STATE_DIR, SELF_EXE};
use nsjoin_runtime::exec::{ExecOptions, exec_in_container, resolve_target};

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Container name or PID of its init process.
    pub container: String,

    /// Command to execute.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,

    /// Directory holding container state records.
    #[arg(long, env = ENV_STATE_DIR, default_value = DEFAULT_STATE_DIR)]
    pub state_dir: PathBuf,

    /// Pass the command in the helper's environment instead of over a pipe.
    #[arg(long)]
    pub direct: bool,

    /// Helper binary to re-execute.
    #[arg(long, default_value = SELF_EXE, hide = true)]
    pub helper: PathBuf,
}

/// Executes the `exec` command.
///
/// Spawns the namespace-join helper, waits for it to join the target's
/// namespaces, hands it the command and exits with the helper's status.
///
/// # Errors
///
/// Returns an error if the container cannot be resolved or the helper fails
/// before acknowledging.
pub fn execute(args: ExecArgs) -> anyhow::Result<()> {
    let pid = resolve_target(&args.state_dir, &args.container)
        .with_context(|| format!("resolving container {}", args.container))?;

    let options = ExecOptions {
        helper: args.helper,
        direct: args.direct,
        ..ExecOptions::default()
    };
    let output = exec_in_container(&pid, &args.command, &options)
        .with_context(|| format!("exec in container {}", args.container))?;

    std::process::exit(output.exit_code);
}
