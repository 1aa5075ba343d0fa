//! Ordered, all-or-nothing namespace joining.

use std::os::fd::AsFd;
use std::path::{Path, PathBuf};

use nsjoin_common::constants::PROC_ROOT;
use nsjoin_common::types::TargetPid;

use super::{JOIN_ORDER, LinuxNamespaceOps, NamespaceKind, NamespaceOps};
use crate::error::NsenterError;

/// Joins every namespace of a target process in [`JOIN_ORDER`].
///
/// The first failure stops the walk. Namespaces joined before it stay
/// joined: the caller is expected to terminate the process.
#[derive(Debug)]
pub struct NamespaceSequencer<O = LinuxNamespaceOps> {
    ops: O,
    proc_root: PathBuf,
}

impl NamespaceSequencer {
    /// Creates a sequencer over the real `/proc` and real system calls.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ops(LinuxNamespaceOps, PROC_ROOT)
    }
}

impl Default for NamespaceSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: NamespaceOps> NamespaceSequencer<O> {
    /// Creates a sequencer with custom operations and procfs root.
    pub fn with_ops(ops: O, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            ops,
            proc_root: proc_root.into(),
        }
    }

    /// Returns `<proc_root>/<pid>/ns/<kind>`.
    #[must_use]
    pub fn namespace_path(&self, pid: &TargetPid, kind: NamespaceKind) -> PathBuf {
        self.proc_root
            .join(pid.as_str())
            .join("ns")
            .join(kind.proc_name())
    }

    /// Joins all five namespaces of `pid`, in order.
    ///
    /// # Errors
    ///
    /// Returns the first open or `setns(2)` failure; later kinds are not
    /// touched.
    pub fn join_all(&mut self, pid: &TargetPid) -> Result<(), NsenterError> {
        for kind in JOIN_ORDER {
            let path = self.namespace_path(pid, kind);
            self.join_one(kind, &path)?;
        }
        tracing::info!(pid = %pid, "joined all namespaces");
        Ok(())
    }

    fn join_one(&mut self, kind: NamespaceKind, path: &Path) -> Result<(), NsenterError> {
        tracing::debug!(kind = %kind, path = %path.display(), "opening namespace");
        let handle = self
            .ops
            .open(path)
            .map_err(|source| NsenterError::OpenNamespace {
                kind,
                path: path.to_path_buf(),
                source,
            })?;

        self.ops
            .join(handle.as_fd(), kind)
            .map_err(|source| NsenterError::JoinNamespace {
                kind,
                path: path.to_path_buf(),
                source,
            })?;
        drop(handle);

        tracing::debug!(kind = %kind, "joined namespace");
        Ok(())
    }

    /// Returns the underlying operations.
    #[cfg(test)]
    pub(crate) fn into_ops(self) -> O {
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::testing::{FakeProc, Op, RecordingOps};

    fn pid() -> TargetPid {
        TargetPid::parse("4242").expect("pid")
    }

    #[test]
    fn joins_in_fixed_order() {
        let proc = FakeProc::with_all("4242");
        let mut seq = NamespaceSequencer::with_ops(RecordingOps::default(), proc.root());

        seq.join_all(&pid()).expect("join all");

        let ops = seq.into_ops();
        let opened: Vec<_> = ops.opened().into_iter().map(|k| k.proc_name()).collect();
        assert_eq!(opened, ["ipc", "uts", "net", "pid", "mnt"]);
        assert_eq!(
            ops.log,
            [
                Op::Open(NamespaceKind::Ipc),
                Op::Join(NamespaceKind::Ipc),
                Op::Open(NamespaceKind::Uts),
                Op::Join(NamespaceKind::Uts),
                Op::Open(NamespaceKind::Net),
                Op::Join(NamespaceKind::Net),
                Op::Open(NamespaceKind::Pid),
                Op::Join(NamespaceKind::Pid),
                Op::Open(NamespaceKind::Mnt),
                Op::Join(NamespaceKind::Mnt),
            ]
        );
    }

    #[test]
    fn open_failure_stops_before_later_kinds() {
        let proc = FakeProc::with_kinds("4242", &[NamespaceKind::Ipc, NamespaceKind::Uts]);
        let mut seq = NamespaceSequencer::with_ops(RecordingOps::default(), proc.root());

        let err = seq.join_all(&pid()).expect_err("net is missing");
        assert!(matches!(
            err,
            NsenterError::OpenNamespace {
                kind: NamespaceKind::Net,
                ..
            }
        ));
        assert_eq!(err.errno(), Some(libc::ENOENT));

        let ops = seq.into_ops();
        assert_eq!(ops.joined(), [NamespaceKind::Ipc, NamespaceKind::Uts]);
        assert!(!ops.log.contains(&Op::Open(NamespaceKind::Pid)));
        assert!(!ops.log.contains(&Op::Open(NamespaceKind::Mnt)));
    }

    #[test]
    fn join_failure_stops_before_mount() {
        let proc = FakeProc::with_all("4242");
        let ops = RecordingOps {
            reject: Some(NamespaceKind::Pid),
            ..RecordingOps::default()
        };
        let mut seq = NamespaceSequencer::with_ops(ops, proc.root());

        let err = seq.join_all(&pid()).expect_err("pid join rejected");
        assert_eq!(err.stage(), "setns pid");
        assert_eq!(err.errno(), Some(libc::EPERM));

        let ops = seq.into_ops();
        assert!(!ops.log.contains(&Op::Open(NamespaceKind::Mnt)));
    }

    #[test]
    fn missing_target_process_fails_on_first_kind() {
        let proc = FakeProc::with_kinds("1", &[]);
        let mut seq = NamespaceSequencer::with_ops(RecordingOps::default(), proc.root());

        let err = seq.join_all(&pid()).expect_err("no such process");
        assert_eq!(err.stage(), "open ipc");
        assert!(seq.into_ops().joined().is_empty());
    }

    #[test]
    fn real_sequencer_reports_vanished_process() {
        let mut seq = NamespaceSequencer::new();
        let gone = TargetPid::parse("999999999").expect("pid");

        let err = seq.join_all(&gone).expect_err("process does not exist");
        assert_eq!(err.stage(), "open ipc");
        assert_eq!(err.errno(), Some(libc::ENOENT));
    }

    #[test]
    fn namespace_path_layout() {
        let seq = NamespaceSequencer::new();
        assert_eq!(
            seq.namespace_path(&pid(), NamespaceKind::Mnt),
            PathBuf::from("/proc/4242/ns/mnt")
        );
    }
}
