//! Entry point of the namespace-join helper.

use nsjoin_common::constants::{APP_NAME, EXIT_FATAL};

use crate::command::{CommandExecutor, CommandPayload};
use crate::config::{self, CommandSource, JoinConfig};
use crate::error::NsenterError;
use crate::namespace::{NamespaceOps, NamespaceSequencer};
use crate::sync;

/// Runs the helper if this process was started as one.
///
/// Returns immediately when `CONTAINER_PID` is absent or empty. Otherwise
/// it joins the target's namespaces, completes the handshake, runs the
/// command and exits the process: it never returns in helper mode.
///
/// # Precondition
///
/// This must be the first statement of `main`. The mount namespace can only
/// be joined by a single-threaded process, so no thread, thread pool or
/// async runtime may exist when it runs.
pub fn nsenter() {
    let outcome = enter_with(
        config::resolve(),
        &mut NamespaceSequencer::new(),
        &CommandExecutor::new(),
    );
    match outcome {
        None => {}
        Some(Ok(exit_code)) => std::process::exit(exit_code),
        Some(Err(e)) => fatal(&e),
    }
}

/// Decides between the inert path and helper mode.
///
/// Returns `None` without touching `sequencer` when the configuration says
/// this process is not a helper. Otherwise sets up helper logging and
/// returns the outcome of [`run_helper`], or the configuration error.
pub fn enter_with<O: NamespaceOps>(
    resolved: Result<Option<JoinConfig>, NsenterError>,
    sequencer: &mut NamespaceSequencer<O>,
    executor: &CommandExecutor,
) -> Option<Result<i32, NsenterError>> {
    let resolved = resolved.transpose()?;
    init_helper_logging();
    Some(resolved.and_then(|config| run_helper(&config, sequencer, executor)))
}

/// Runs every helper stage after configuration.
///
/// Returns the exit status the helper should terminate with.
///
/// # Errors
///
/// Returns the first fatal failure: a namespace that cannot be opened or
/// joined, or a synchronization descriptor that is required but unusable.
pub fn run_helper<O: NamespaceOps>(
    config: &JoinConfig,
    sequencer: &mut NamespaceSequencer<O>,
    executor: &CommandExecutor,
) -> Result<i32, NsenterError> {
    tracing::info!(pid = %config.target, "joining container namespaces");
    sequencer.join_all(&config.target)?;

    let payload = match &config.command {
        CommandSource::Channel(command_fd) => {
            let _ = sync::acknowledge(config.ack)?;
            sync::receive_command(*command_fd)?
        }
        CommandSource::Direct(text) => {
            if config.ack.is_valid() {
                let _ = sync::acknowledge(config.ack)?;
            } else {
                tracing::debug!("no acknowledgement channel in direct mode");
            }
            CommandPayload::from_text(text)
        }
    };

    Ok(executor.execute(&payload))
}

fn init_helper_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Command output shares stdout with the caller; diagnostics stay on stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[allow(clippy::print_stderr)]
fn fatal(err: &NsenterError) -> ! {
    tracing::debug!(stage = %err.stage(), errno = ?err.errno(), "helper terminating");
    eprintln!(
        "{APP_NAME}: nsenter {} failed: {err} (errno {})",
        err.stage(),
        err.errno().unwrap_or(0)
    );
    std::process::exit(EXIT_FATAL);
}
