//! Supervisor side of the nsjoin handshake.
//!
//! Resolves which process to join, wires the synchronization pipes,
//! re-executes the binary as the namespace-join helper and drives the
//! acknowledge-then-send protocol.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod exec;
pub mod state;
