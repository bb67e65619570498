//! Shared orchestrator state

use std::sync::Arc;

use rt_core::config::RoundTableConfig;

use crate::console::Console;
use crate::input::InputRouter;
use crate::log::ConversationLog;
use crate::registry::ChildRegistry;
use crate::router::CatchUpRouter;
use crate::scheduler::LoopScheduler;

/// State shared by every task in one run
pub struct OrchestratorState {
    /// Configuration
    pub config: RoundTableConfig,
    /// Conversation log
    pub log: Arc<ConversationLog>,
    /// Registered children
    pub registry: Arc<ChildRegistry>,
    /// Operator console
    pub console: Arc<Console>,
    /// Catch-up router
    pub router: CatchUpRouter,
    /// Autonomous loop
    pub scheduler: Arc<LoopScheduler>,
}

impl OrchestratorState {
    /// Wire up state around an already populated registry
    pub fn new(
        config: RoundTableConfig,
        registry: ChildRegistry,
        log: Arc<ConversationLog>,
        console: Arc<Console>,
    ) -> Self {
        let registry = Arc::new(registry);
        let router = CatchUpRouter::new(Arc::clone(&log), config.operator_name.as_str());
        let scheduler = Arc::new(LoopScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&log),
            router.clone(),
            config.scheduler.clone(),
        ));

        Self {
            config,
            log,
            registry,
            console,
            router,
            scheduler,
        }
    }

    /// Router for operator input over this state
    pub fn input_router(&self) -> InputRouter {
        InputRouter::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.log),
            self.router.clone(),
            Arc::clone(&self.scheduler),
            Arc::clone(&self.console),
        )
    }
}
