//! # nsjoin
//!
//! Runs commands inside the namespaces of a running container.
//!
//! The same binary is both the supervisor (`nsjoin exec`) and the helper it
//! re-executes: the helper path is taken before argument parsing, while the
//! process is still single-threaded.

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    // Must stay first: joining the mount namespace requires a single thread.
    nsjoin_core::nsenter::nsenter();

    let cli = Cli::parse();
    init_tracing(cli.log_json);
    commands::execute(cli)
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
