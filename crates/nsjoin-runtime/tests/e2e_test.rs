//! End-to-end tests for the supervisor side of the handshake.
//!
//! A small shell script stands in for the helper so the protocol can be
//! exercised without privileges:
//! 1. Acknowledgement marker read from the ack pipe
//! 2. Command delivery over the command pipe
//! 3. Direct mode through `CONTAINER_CMD`
//! 4. Helper failures before acknowledging or before reading the command
//! 5. Exit code reporting

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::ffi::OsString;
use std::path::PathBuf;

use nsjoin_common::constants::ack_marker;
use nsjoin_common::error::NsjoinError;
use nsjoin_common::types::TargetPid;
use nsjoin_runtime::exec::{ExecOptions, exec_in_container};

/// `printf` escape sequence for the acknowledgement marker.
fn marker_escape() -> String {
    ack_marker().iter().map(|b| format!("\\{b:03o}")).collect()
}

fn fake_helper(script: &str, direct: bool) -> ExecOptions {
    ExecOptions {
        helper: PathBuf::from("/bin/sh"),
        helper_args: vec![OsString::from("-c"), OsString::from(script)],
        direct,
    }
}

fn target() -> TargetPid {
    TargetPid::parse("4242").unwrap()
}

fn words(cmd: &[&str]) -> Vec<String> {
    cmd.iter().map(|s| (*s).to_owned()).collect()
}

// ── Handshake ────────────────────────────────────────────────────────

#[test]
fn handshake_delivers_command_after_ack() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("received");
    let script = format!(
        r#"[ "$CONTAINER_PID" = 4242 ] || exit 9
printf '{marker}' > /dev/fd/$CONTAINER_PIPE_PARENT
cat /dev/fd/$CONTAINER_PIPE_COMMAND > {out}
exit 0"#,
        marker = marker_escape(),
        out = out.display(),
    );

    let output = exec_in_container(&target(), &words(&["echo", "hello"]), &fake_helper(&script, false))
        .expect("exec");

    assert_eq!(output.exit_code, 0);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "echo hello");
}

#[test]
fn helper_exit_code_is_reported() {
    let script = format!(
        r"printf '{}' > /dev/fd/$CONTAINER_PIPE_PARENT
cat /dev/fd/$CONTAINER_PIPE_COMMAND > /dev/null
exit 7",
        marker_escape(),
    );

    let output =
        exec_in_container(&target(), &words(&["true"]), &fake_helper(&script, false)).expect("exec");
    assert_eq!(output.exit_code, 7);
    assert!(output.helper_pid > 0);
}

// ── Direct mode ──────────────────────────────────────────────────────

#[test]
fn direct_mode_passes_command_in_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("received");
    let script = format!(
        r#"[ -z "${{CONTAINER_PIPE_COMMAND+x}}" ] || exit 5
printf '{marker}' > /dev/fd/$CONTAINER_PIPE_PARENT
printf '%s' "$CONTAINER_CMD" > {out}"#,
        marker = marker_escape(),
        out = out.display(),
    );

    let output = exec_in_container(&target(), &words(&["ls", "-l", "/"]), &fake_helper(&script, true))
        .expect("exec");

    assert_eq!(output.exit_code, 0);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "ls -l /");
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn helper_dying_before_ack_is_a_handshake_error() {
    let err = exec_in_container(&target(), &words(&["true"]), &fake_helper("exit 1", false))
        .expect_err("no ack");

    match err {
        NsjoinError::Handshake { message } => {
            assert!(message.contains("closed the acknowledgement pipe"), "{message}");
            assert!(message.contains("exit code 1"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn helper_closing_command_pipe_is_reaped_and_reported() {
    // dash only redirects single-digit descriptors; bash handles any.
    let script = format!(
        r#"eval "exec $CONTAINER_PIPE_COMMAND<&-"
printf '{}' > /dev/fd/$CONTAINER_PIPE_PARENT
exit 4"#,
        marker_escape(),
    );
    let options = ExecOptions {
        helper: PathBuf::from("/bin/bash"),
        ..fake_helper(&script, false)
    };

    let err = exec_in_container(&target(), &words(&["echo", "hello"]), &options)
        .expect_err("command pipe closed");

    match err {
        NsjoinError::Handshake { message } => {
            assert!(message.contains("writing command"), "{message}");
            assert!(message.contains("exit code 4"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn wrong_marker_is_rejected() {
    let script = r"printf 'nope' > /dev/fd/$CONTAINER_PIPE_PARENT";
    let err = exec_in_container(&target(), &words(&["true"]), &fake_helper(script, false))
        .expect_err("bad marker");
    assert!(matches!(err, NsjoinError::Handshake { .. }));
}

#[test]
fn missing_helper_binary_is_an_io_error() {
    let options = ExecOptions {
        helper: PathBuf::from("/nonexistent/nsjoin"),
        ..ExecOptions::default()
    };
    let err = exec_in_container(&target(), &words(&["true"]), &options).expect_err("spawn");
    assert!(matches!(err, NsjoinError::Io { .. }));
}

#[test]
fn empty_command_is_rejected_before_spawning() {
    let err = exec_in_container(&target(), &[], &fake_helper("exit 3", false)).expect_err("empty");
    assert!(matches!(err, NsjoinError::Config { .. }));
}
