//! One round-table run: spawn, route, shut down

use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use rt_core::config::RoundTableConfig;
use rt_core::RtError;

use crate::console::Console;
use crate::input::spawn_input_reader;
use crate::log::ConversationLog;
use crate::state::OrchestratorState;
use crate::supervisor::{ChildExit, Supervisor};

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Last non-zero child exit code, else 0
    pub exit_code: i32,
    /// Entries in the conversation log at shutdown
    pub messages: usize,
    /// Per-child exit codes in registration order
    pub exits: Vec<ChildExit>,
}

/// A launched round table
pub struct RoundTable {
    state: Arc<OrchestratorState>,
    supervisor: Supervisor,
}

impl RoundTable {
    /// Spawn every configured child.
    ///
    /// Fails with [`RtError::NoChildren`] if none of them started.
    pub fn launch(config: RoundTableConfig, console: Arc<Console>) -> Result<Self, RtError> {
        let log = Arc::new(ConversationLog::new());
        let (registry, supervisor) =
            Supervisor::spawn_all(&config.children, Arc::clone(&log), Arc::clone(&console));

        if registry.is_empty() {
            return Err(RtError::NoChildren);
        }
        tracing::info!(children = registry.len(), "Round table ready");

        let state = Arc::new(OrchestratorState::new(config, registry, log, console));
        Ok(Self { state, supervisor })
    }

    /// Shared state of this run
    pub fn state(&self) -> &Arc<OrchestratorState> {
        &self.state
    }

    /// Route operator input until every child has exited.
    ///
    /// End of `input` or cancellation of `cancel` closes every child's
    /// stdin; the run then completes once the children exit on their own.
    pub async fn run<R>(self, input: R, cancel: CancellationToken) -> RunSummary
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let input_cancel = cancel.child_token();
        let (lines, reader) = spawn_input_reader(input, input_cancel.clone());

        let router = self.state.input_router();
        let router_cancel = input_cancel.clone();
        let router_task = tokio::spawn(async move { router.run(lines, router_cancel).await });

        let report = self.supervisor.shutdown().await;

        // nobody left to talk to
        input_cancel.cancel();
        if let Err(e) = router_task.await {
            tracing::warn!(error = %e, "Input router task failed");
        }
        reader.abort();

        tracing::info!(
            exit_code = report.exit_code,
            lines = report.lines,
            "All children finished"
        );

        RunSummary {
            exit_code: report.exit_code,
            messages: self.state.log.len(),
            exits: report.exits,
        }
    }
}

impl std::fmt::Debug for RoundTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundTable")
            .field("children", &self.state.registry.len())
            .field("supervisor", &self.supervisor)
            .finish()
    }
}
