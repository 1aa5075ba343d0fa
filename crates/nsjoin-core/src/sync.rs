//! Helper side of the acknowledge-then-receive handshake.
//!
//! Both descriptors are inherited from the supervisor. The helper takes
//! ownership of each one exactly once and closes it when done.

use std::fs::File;
use std::io::Write;
use std::os::fd::{FromRawFd, OwnedFd};

use nix::errno::Errno;
use nsjoin_common::constants::{ACK_MARKER_LEN, ack_marker};
use nsjoin_common::types::PipeDescriptor;

use crate::command::CommandPayload;
use crate::error::{Channel, NsenterError};

/// Takes ownership of an inherited descriptor.
///
/// The invalid sentinel and numbers that are not open descriptors are both
/// rejected before anything is done with them.
fn claim(fd: PipeDescriptor, channel: Channel) -> Result<File, NsenterError> {
    let unusable = |source: std::io::Error| NsenterError::Descriptor {
        channel,
        fd: fd.raw(),
        source,
    };
    if !fd.is_valid() {
        return Err(unusable(Errno::EBADF.into()));
    }

    // SAFETY: F_GETFD only inspects the descriptor table entry; it has no
    // effect on the descriptor and is defined for any integer.
    if unsafe { libc::fcntl(fd.raw(), libc::F_GETFD) } == -1 {
        return Err(unusable(std::io::Error::last_os_error()));
    }

    // SAFETY: the descriptor is open and was handed to this process by the
    // supervisor for exclusive use by the helper; nothing else in the
    // process owns it.
    let owned = unsafe { OwnedFd::from_raw_fd(fd.raw()) };
    Ok(File::from(owned))
}

/// Tells the supervisor that every namespace has been joined.
///
/// Writes the marker once, then closes the descriptor. A short or failed
/// write is logged and tolerated: the supervisor notices through its own
/// read. Returns the number of marker bytes written.
///
/// # Errors
///
/// Returns an error if the descriptor is invalid or not open.
pub fn acknowledge(ack: PipeDescriptor) -> Result<usize, NsenterError> {
    let mut channel = claim(ack, Channel::Ack)?;

    let written = match channel.write(&ack_marker()) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(fd = %ack, error = %e, "acknowledgement write failed");
            0
        }
    };
    if written == ACK_MARKER_LEN {
        tracing::debug!(fd = %ack, "acknowledgement sent");
    } else if written > 0 {
        tracing::warn!(fd = %ack, written, "short acknowledgement write");
    }

    drop(channel);
    Ok(written)
}

/// Blocks until the supervisor sends the command.
///
/// A single read is issued: whatever arrives is the command, even if it is
/// shorter than the buffer. A read error yields an empty payload. The
/// descriptor is closed afterwards.
///
/// # Errors
///
/// Returns an error if the descriptor is invalid or not open.
pub fn receive_command(command: PipeDescriptor) -> Result<CommandPayload, NsenterError> {
    let mut channel = claim(command, Channel::Command)?;

    let payload = CommandPayload::read_once(&mut channel).unwrap_or_else(|e| {
        tracing::warn!(fd = %command, error = %e, "command read failed");
        CommandPayload::empty()
    });
    tracing::debug!(fd = %command, command = %payload.text(), "command received");

    drop(channel);
    Ok(payload)
}
