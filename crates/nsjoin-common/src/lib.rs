//! # nsjoin-common
//!
//! Shared types, error definitions, and constants used across the nsjoin
//! workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and carries the environment contract shared by the
//! supervisor (`nsjoin exec`) and the namespace-join helper.

pub mod constants;
pub mod error;
pub mod types;
