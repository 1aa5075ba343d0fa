//! Linux namespace joining for the helper process.
//!
//! Provides the fixed join order, a seam over `open(2)`/`setns(2)`, and the
//! sequencer that walks `/proc/<pid>/ns/<kind>` for each kind.

mod ops;
mod sequencer;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

#[cfg(target_os = "linux")]
use nix::sched::CloneFlags;

pub use ops::{LinuxNamespaceOps, NamespaceOps};
pub use sequencer::NamespaceSequencer;

/// The namespace kinds joined by the helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// System V IPC objects and POSIX message queues.
    Ipc,
    /// Hostname and NIS domain name.
    Uts,
    /// Network stack: interfaces, routes, firewall.
    Net,
    /// Process ID number space.
    Pid,
    /// Mount table.
    Mnt,
}

/// Order in which namespaces are joined.
///
/// `mnt` is last: every `/proc/<pid>/ns/<kind>` path before it must be
/// resolved against the mount view the helper started in.
pub const JOIN_ORDER: [NamespaceKind; 5] = [
    NamespaceKind::Ipc,
    NamespaceKind::Uts,
    NamespaceKind::Net,
    NamespaceKind::Pid,
    NamespaceKind::Mnt,
];

impl NamespaceKind {
    /// File name of this kind under `/proc/<pid>/ns/`.
    #[must_use]
    pub const fn proc_name(self) -> &'static str {
        match self {
            Self::Ipc => "ipc",
            Self::Uts => "uts",
            Self::Net => "net",
            Self::Pid => "pid",
            Self::Mnt => "mnt",
        }
    }

    /// `setns(2)` type flag for this kind.
    #[cfg(target_os = "linux")]
    #[must_use]
    pub const fn clone_flag(self) -> CloneFlags {
        match self {
            Self::Ipc => CloneFlags::CLONE_NEWIPC,
            Self::Uts => CloneFlags::CLONE_NEWUTS,
            Self::Net => CloneFlags::CLONE_NEWNET,
            Self::Pid => CloneFlags::CLONE_NEWPID,
            Self::Mnt => CloneFlags::CLONE_NEWNS,
        }
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.proc_name())
    }
}
