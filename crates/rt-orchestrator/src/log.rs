//! Shared conversation log
//!
//! The log is the single ordered record of every operator and child
//! utterance. Appends from the input router and every output pump are
//! serialized by one lock, so the log is a total order consistent with each
//! writer's own append order. Entries are never reordered or mutated.
//!
//! # Tentative appends
//!
//! A targeted operator line is appended before its target is known to be
//! reachable. [`ConversationLog::begin`] pushes the entry while holding the
//! write lock; the entry becomes visible only on [`PendingAppend::commit`].
//! Dropping the pending append rolls it back, and because the lock was held
//! throughout, no reader can have observed it.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};

use rt_core::Message;

/// Append-only, lock-guarded conversation log
#[derive(Debug, Default)]
pub struct ConversationLog {
    entries: RwLock<Vec<Arc<Message>>>,
}

impl ConversationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append a message, returning its position
    pub fn append(&self, message: Message) -> usize {
        let mut entries = self.entries.write();
        entries.push(Arc::new(message));
        entries.len() - 1
    }

    /// Tentatively append a message; see the module docs
    pub fn begin(&self, message: Message) -> PendingAppend<'_> {
        let message = Arc::new(message);
        let mut entries = self.entries.write();
        entries.push(Arc::clone(&message));
        PendingAppend {
            entries,
            message,
            committed: false,
        }
    }

    /// Consistent copy of all committed entries, in log order
    pub fn snapshot(&self) -> Vec<Arc<Message>> {
        self.entries.read().clone()
    }

    /// Number of committed entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// A log entry that is not yet visible to readers.
///
/// Holds the log's write lock, so keep it short-lived and never hold it
/// across an `.await`.
#[must_use = "dropping a pending append rolls it back"]
pub struct PendingAppend<'a> {
    entries: RwLockWriteGuard<'a, Vec<Arc<Message>>>,
    message: Arc<Message>,
    committed: bool,
}

impl PendingAppend<'_> {
    /// The message being appended
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Make the entry visible, returning its position
    pub fn commit(mut self) -> usize {
        self.committed = true;
        self.entries.len() - 1
    }

    /// Discard the entry
    pub fn rollback(self) {}
}

impl Drop for PendingAppend<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.entries.pop();
        }
    }
}
