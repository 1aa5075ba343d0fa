//! # nsjoin-core
//!
//! The namespace-join helper that runs before the rest of the program.
//!
//! The helper is a strictly linear sequence of four stages:
//! - **Config**: resolve the target PID, pipe descriptors and direct command
//!   from the environment, once.
//! - **Namespaces**: join `ipc`, `uts`, `net`, `pid` and `mnt` of the target,
//!   in that order.
//! - **Sync**: acknowledge the supervisor, then receive the command.
//! - **Command**: run the command through `/bin/sh -c` and exit.
//!
//! [`nsenter::nsenter`] drives the whole sequence and must be the first
//! statement of `main`, while the process still has a single thread.
//! All unsafe system calls are encapsulated in safe wrappers with
//! `// SAFETY:` documentation.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod command;
pub mod config;
pub mod error;
pub mod namespace;
pub mod nsenter;
pub mod sync;
