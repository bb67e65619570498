//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding agent traffic
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A transcript could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error on the underlying pipe
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the error means the peer has gone away (closed pipe)
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::UnexpectedEof
            )
        )
    }
}
