//! rt-protocol: Wire format between the round-table orchestrator and its agents
//!
//! Agents are plain processes speaking UTF-8 lines over stdio. The orchestrator
//! writes one JSON array per turn to an agent's stdin and reads free-form text
//! lines back from its stdout and stderr.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{ChildLineCodec, TranscriptCodec};
pub use error::ProtocolError;
pub use message::{Transcript, TranscriptEntry, WireRole};
