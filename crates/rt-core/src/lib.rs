//! rt-core: Core abstractions and configuration for round-table
//!
//! This crate provides the shared domain types, the console color grammar,
//! configuration loading, and the error taxonomy used by the orchestrator
//! and the CLI.

pub mod color;
pub mod config;
pub mod error;
pub mod types;

pub use color::ConsoleColor;
pub use error::RtError;
pub use types::{ChildId, ChildName, Message, Role};
