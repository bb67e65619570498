//! Child registry
//!
//! Tracks every child that was successfully spawned, in registration order.
//! Membership is fixed after startup; a child's `alive` and `talking` flags
//! change as it runs.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::codec::FramedWrite;

use rt_core::error::SpawnError;
use rt_core::{ChildId, ChildName, ConsoleColor};
use rt_protocol::TranscriptCodec;

/// Framed writer over a child's stdin
pub type StdinSink = FramedWrite<Pin<Box<dyn AsyncWrite + Send>>, TranscriptCodec>;

/// Runtime handle for one child
pub struct ChildHandle {
    id: ChildId,
    name: ChildName,
    color: Option<ConsoleColor>,
    /// Set when a transcript is sent, cleared when any line comes back
    talking: AtomicBool,
    alive: AtomicBool,
    /// `None` once stdin has been closed
    stdin: Mutex<Option<StdinSink>>,
}

impl ChildHandle {
    /// Create a handle writing transcripts to `stdin`
    pub fn new<W>(id: ChildId, name: ChildName, color: Option<ConsoleColor>, stdin: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        let writer: Pin<Box<dyn AsyncWrite + Send>> = Box::pin(stdin);
        Self {
            id,
            name,
            color,
            talking: AtomicBool::new(false),
            alive: AtomicBool::new(true),
            stdin: Mutex::new(Some(FramedWrite::new(writer, TranscriptCodec::new()))),
        }
    }

    pub fn id(&self) -> ChildId {
        self.id
    }

    pub fn name(&self) -> &ChildName {
        &self.name
    }

    pub fn color(&self) -> Option<ConsoleColor> {
        self.color
    }

    /// Whether the child owes a reply
    pub fn is_talking(&self) -> bool {
        self.talking.load(Ordering::SeqCst)
    }

    pub fn set_talking(&self, talking: bool) {
        self.talking.store(talking, Ordering::SeqCst);
    }

    /// Whether the child is still running
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Record that the child has exited. Clears `talking` too.
    pub fn mark_exited(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.talking.store(false, Ordering::SeqCst);
    }

    /// Lock the stdin writer. Deliveries hold this for a whole transcript
    /// so two transcripts can never interleave on one pipe.
    pub async fn lock_stdin(&self) -> MutexGuard<'_, Option<StdinSink>> {
        self.stdin.lock().await
    }

    /// Flush and close stdin so the child sees end of input
    pub async fn close_stdin(&self) {
        let mut guard = self.stdin.lock().await;
        if let Some(mut sink) = guard.take() {
            if let Err(e) = sink.close().await {
                tracing::debug!(child = %self.name, error = %e, "Error closing stdin");
            }
        }
    }
}

impl std::fmt::Debug for ChildHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .field("talking", &self.is_talking())
            .finish()
    }
}

/// All registered children
#[derive(Debug, Default)]
pub struct ChildRegistry {
    children: Vec<Arc<ChildHandle>>,
    by_name: HashMap<ChildName, ChildId>,
}

impl ChildRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a child. Names are unique case-insensitively.
    pub fn register<W>(
        &mut self,
        name: ChildName,
        color: Option<ConsoleColor>,
        stdin: W,
    ) -> Result<Arc<ChildHandle>, SpawnError>
    where
        W: AsyncWrite + Send + 'static,
    {
        if self.by_name.contains_key(&name) {
            return Err(SpawnError::DuplicateName(name.to_string()));
        }

        let id = ChildId::new(self.children.len());
        let handle = Arc::new(ChildHandle::new(id, name.clone(), color, stdin));
        self.by_name.insert(name, id);
        self.children.push(Arc::clone(&handle));
        Ok(handle)
    }

    pub fn get(&self, id: ChildId) -> Option<&Arc<ChildHandle>> {
        self.children.get(id.index())
    }

    /// Find a child by name, case-insensitively, alive or not
    pub fn lookup(&self, name: &str) -> Option<&Arc<ChildHandle>> {
        let id = self.by_name.get(&ChildName::new(name))?;
        self.get(*id)
    }

    /// Find a running child by name
    pub fn live(&self, name: &str) -> Option<&Arc<ChildHandle>> {
        self.lookup(name).filter(|c| c.is_alive())
    }

    /// Running children in registration order
    pub fn live_children(&self) -> Vec<Arc<ChildHandle>> {
        self.children
            .iter()
            .filter(|c| c.is_alive())
            .cloned()
            .collect()
    }

    /// Whether any running child owes a reply
    pub fn any_talking(&self) -> bool {
        self.children.iter().any(|c| c.is_alive() && c.is_talking())
    }

    /// Names of running children that owe a reply
    pub fn talking_names(&self) -> Vec<String> {
        self.children
            .iter()
            .filter(|c| c.is_alive() && c.is_talking())
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Close every child's stdin
    pub async fn close_all_stdin(&self) {
        for child in &self.children {
            child.close_stdin().await;
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
