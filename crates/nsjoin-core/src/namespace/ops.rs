//! The two system calls a namespace join needs.

use std::fs::File;
use std::os::fd::{BorrowedFd, OwnedFd};
use std::path::Path;

use super::NamespaceKind;

/// Opens namespace files and joins them.
///
/// The sequencer only talks to namespaces through this trait, so tests can
/// observe the exact sequence of opens and joins.
pub trait NamespaceOps {
    /// Opens a namespace file read-only.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the file cannot be opened.
    fn open(&mut self, path: &Path) -> std::io::Result<OwnedFd>;

    /// Moves the calling process into the namespace behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the kernel rejects the join.
    fn join(&mut self, handle: BorrowedFd<'_>, kind: NamespaceKind) -> std::io::Result<()>;
}

/// Real `open(2)` + `setns(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxNamespaceOps;

impl NamespaceOps for LinuxNamespaceOps {
    fn open(&mut self, path: &Path) -> std::io::Result<OwnedFd> {
        // O_RDONLY | O_CLOEXEC
        File::open(path).map(OwnedFd::from)
    }

    #[cfg(target_os = "linux")]
    fn join(&mut self, handle: BorrowedFd<'_>, kind: NamespaceKind) -> std::io::Result<()> {
        nix::sched::setns(handle, kind.clone_flag()).map_err(std::io::Error::from)
    }

    /// Stub for non-Linux platforms: namespaces do not exist there.
    #[cfg(not(target_os = "linux"))]
    fn join(&mut self, _handle: BorrowedFd<'_>, kind: NamespaceKind) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("joining the {kind} namespace requires Linux"),
        ))
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn opens_own_namespace_file() {
        let mut ops = LinuxNamespaceOps;
        let handle = ops.open(Path::new("/proc/self/ns/ipc"));
        assert!(handle.is_ok());
    }

    #[test]
    fn open_of_missing_process_fails_with_enoent() {
        let mut ops = LinuxNamespaceOps;
        let err = ops
            .open(Path::new("/proc/999999999/ns/ipc"))
            .expect_err("no such process");
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    }
}
