//! CLI command definitions and dispatch.

pub mod exec;

use clap::{Parser, Subcommand};

/// nsjoin — run commands inside a running container's namespaces.
#[derive(Parser, Debug)]
#[command(name = "nsjoin", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a command inside a running container.
    Exec(exec::ExecArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Exec(args) => exec::execute(args),
    }
}
