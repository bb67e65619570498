//! round-table: Command-line front end
//!
//! Provides the `round-table` binary: load a children config, spawn the
//! agents, and relay the operator's console to them.

pub mod exit;
pub mod output;
pub mod signal;
