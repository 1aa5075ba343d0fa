//! Fake `/proc` trees and recording namespace operations for tests.

use std::fs::File;
use std::os::fd::{BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};

use super::{JOIN_ORDER, NamespaceKind, NamespaceOps};

/// A temporary directory laid out like `/proc/<pid>/ns/<kind>`.
pub struct FakeProc {
    dir: tempfile::TempDir,
}

impl FakeProc {
    /// Creates namespace files for every kind.
    pub fn with_all(pid: &str) -> Self {
        Self::with_kinds(pid, &JOIN_ORDER)
    }

    /// Creates namespace files only for `kinds`.
    pub fn with_kinds(pid: &str, kinds: &[NamespaceKind]) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let ns_dir = dir.path().join(pid).join("ns");
        std::fs::create_dir_all(&ns_dir).expect("create ns dir");
        for kind in kinds {
            std::fs::write(ns_dir.join(kind.proc_name()), b"").expect("write ns file");
        }
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Open(NamespaceKind),
    Join(NamespaceKind),
}

/// Opens real files but only records joins.
#[derive(Debug, Default)]
pub struct RecordingOps {
    pub log: Vec<Op>,
    /// Kind whose join fails with `EPERM`.
    pub reject: Option<NamespaceKind>,
}

impl RecordingOps {
    pub fn opened(&self) -> Vec<NamespaceKind> {
        self.log
            .iter()
            .filter_map(|op| match op {
                Op::Open(kind) => Some(*kind),
                Op::Join(_) => None,
            })
            .collect()
    }

    pub fn joined(&self) -> Vec<NamespaceKind> {
        self.log
            .iter()
            .filter_map(|op| match op {
                Op::Join(kind) => Some(*kind),
                Op::Open(_) => None,
            })
            .collect()
    }
}

fn kind_of(path: &Path) -> NamespaceKind {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    JOIN_ORDER
        .into_iter()
        .find(|k| k.proc_name() == name)
        .expect("namespace file name")
}

impl NamespaceOps for RecordingOps {
    fn open(&mut self, path: &Path) -> std::io::Result<OwnedFd> {
        self.log.push(Op::Open(kind_of(path)));
        File::open(path).map(OwnedFd::from)
    }

    fn join(&mut self, _handle: BorrowedFd<'_>, kind: NamespaceKind) -> std::io::Result<()> {
        self.log.push(Op::Join(kind));
        if self.reject == Some(kind) {
            return Err(std::io::Error::from_raw_os_error(libc::EPERM));
        }
        Ok(())
    }
}
