//! Catch-up router
//!
//! Every delivery sends the target the whole conversation, relabeled from
//! its point of view. Nothing is tracked per child: the transcript is
//! rebuilt from the log each time, so a delivery can never skip or repeat a
//! message regardless of what was appended concurrently.

use std::sync::Arc;

use futures::SinkExt;

use rt_core::error::DeliveryError;
use rt_core::{ChildName, Message, Role};
use rt_protocol::{Transcript, TranscriptEntry};

use crate::log::ConversationLog;
use crate::registry::ChildHandle;

/// Builds and sends per-child transcripts
#[derive(Debug, Clone)]
pub struct CatchUpRouter {
    log: Arc<ConversationLog>,
    operator_name: Arc<str>,
}

impl CatchUpRouter {
    pub fn new(log: Arc<ConversationLog>, operator_name: impl Into<Arc<str>>) -> Self {
        Self {
            log,
            operator_name: operator_name.into(),
        }
    }

    /// The full log as seen by `target`
    pub fn transcript_for(&self, target: &ChildName) -> Transcript {
        relabel(&self.log.snapshot(), target, &self.operator_name)
    }

    /// Send `child` its current transcript.
    ///
    /// The child's stdin lock is taken before the log is read, so two
    /// deliveries to one child are written in the order they saw the log.
    pub async fn deliver(&self, child: &ChildHandle) -> Result<usize, DeliveryError> {
        let mut stdin = child.lock_stdin().await;
        let Some(sink) = stdin.as_mut() else {
            return Err(DeliveryError::StdinClosed(child.name().to_string()));
        };

        let transcript = self.transcript_for(child.name());
        let entries = transcript.len();

        child.set_talking(true);
        if let Err(source) = sink.send(transcript).await {
            child.set_talking(false);
            if source.is_disconnect() {
                tracing::debug!(child = %child.name(), "Child closed its stdin");
            }
            return Err(DeliveryError::Write {
                name: child.name().to_string(),
                source,
            });
        }

        tracing::debug!(child = %child.name(), entries, "Delivered transcript");
        Ok(entries)
    }
}

/// Relabel log messages for one receiver
pub fn relabel<M>(messages: &[M], target: &ChildName, operator_name: &str) -> Transcript
where
    M: AsRef<Message>,
{
    messages
        .iter()
        .map(|m| {
            let m = m.as_ref();
            match &m.role {
                Role::Operator => TranscriptEntry::quoted(operator_name, &m.text),
                Role::Child(name) if name == target => TranscriptEntry::own(m.text.clone()),
                Role::Child(name) => TranscriptEntry::quoted(name.as_str(), &m.text),
            }
        })
        .collect()
}
