//! Autonomous loop scheduler
//!
//! While active, the scheduler keeps the conversation going without the
//! operator: every tick, if nobody owes a reply, it hands the turn to a
//! random live child other than the one it addressed last.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use rt_core::config::SchedulerConfig;
use rt_core::error::SchedulerError;
use rt_core::{ChildId, ChildName, Message};

use crate::log::ConversationLog;
use crate::registry::{ChildHandle, ChildRegistry};
use crate::router::CatchUpRouter;

struct ActiveLoop {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveLoop {
    fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

/// Round-robin driver for the `loop` / `stop` commands
pub struct LoopScheduler {
    registry: Arc<ChildRegistry>,
    log: Arc<ConversationLog>,
    router: CatchUpRouter,
    config: SchedulerConfig,
    active: Mutex<Option<ActiveLoop>>,
}

impl LoopScheduler {
    pub fn new(
        registry: Arc<ChildRegistry>,
        log: Arc<ConversationLog>,
        router: CatchUpRouter,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            log,
            router,
            config,
            active: Mutex::new(None),
        }
    }

    /// Whether the loop is active
    pub fn is_running(&self) -> bool {
        self.active.lock().as_ref().is_some_and(ActiveLoop::is_running)
    }

    /// Start the loop.
    ///
    /// Refuses while any child owes a reply. Otherwise appends the loop
    /// prompt, delivers it to a random live child, and returns that child's
    /// name.
    pub async fn start(&self) -> Result<ChildName, SchedulerError> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let talking = self.registry.talking_names();
        if !talking.is_empty() {
            return Err(SchedulerError::ChildrenTalking(talking));
        }

        let mut rng = StdRng::from_entropy();
        let live = self.registry.live_children();
        let first = pick_next(&live, None, &mut rng)
            .cloned()
            .ok_or(SchedulerError::NoLiveChildren)?;

        self.log.append(Message::operator(self.config.prompt.clone()));
        if let Err(e) = self.router.deliver(&first).await {
            tracing::warn!(child = %first.name(), error = %e, "Loop kick-off delivery failed");
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.registry),
            self.router.clone(),
            self.config.clone(),
            first.id(),
            cancel.clone(),
            rng,
        ));

        *self.active.lock() = Some(ActiveLoop { cancel, task });
        tracing::info!(first = %first.name(), "Loop started");
        Ok(first.name().clone())
    }

    /// Stop the loop and wait for any in-flight delivery to finish
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let active = self.active.lock().take();
        let Some(active) = active.filter(ActiveLoop::is_running) else {
            return Err(SchedulerError::NotRunning);
        };

        active.cancel.cancel();
        if let Err(e) = active.task.await {
            tracing::warn!(error = %e, "Loop task ended abnormally");
        }
        tracing::info!("Loop stopped");
        Ok(())
    }
}

impl std::fmt::Debug for LoopScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopScheduler")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run_loop(
    registry: Arc<ChildRegistry>,
    router: CatchUpRouter,
    config: SchedulerConfig,
    first: ChildId,
    cancel: CancellationToken,
    mut rng: StdRng,
) {
    let mut last = Some(first);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.tick) => {}
        }

        if registry.any_talking() {
            tracing::trace!("Loop waiting on replies");
            continue;
        }

        let live = registry.live_children();
        let Some(next) = pick_next(&live, last, &mut rng) else {
            tracing::info!("No live children left, loop ending");
            break;
        };

        match router.deliver(next).await {
            Ok(entries) => tracing::debug!(child = %next.name(), entries, "Loop turn"),
            Err(e) => tracing::warn!(child = %next.name(), error = %e, "Loop delivery failed"),
        }
        last = Some(next.id());

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.stop_window) => {}
        }
    }
}

/// Choose the next child to address.
///
/// Uniform over `live` excluding `last`, unless `last` is the only choice.
pub fn pick_next<'a, R: Rng + ?Sized>(
    live: &'a [Arc<ChildHandle>],
    last: Option<ChildId>,
    rng: &mut R,
) -> Option<&'a Arc<ChildHandle>> {
    let others: Vec<&Arc<ChildHandle>> = live.iter().filter(|c| Some(c.id()) != last).collect();
    if others.is_empty() {
        return live.choose(rng);
    }
    others.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn handles(n: usize) -> Vec<Arc<ChildHandle>> {
        (0..n)
            .map(|i| {
                Arc::new(ChildHandle::new(
                    ChildId::new(i),
                    ChildName::new(format!("c{}", i)),
                    None,
                    tokio::io::sink(),
                ))
            })
            .collect()
    }

    fn scheduler(names: &[&str]) -> (LoopScheduler, Arc<ChildRegistry>, Arc<ConversationLog>) {
        let mut registry = ChildRegistry::new();
        for name in names {
            registry
                .register(ChildName::new(*name), None, tokio::io::sink())
                .unwrap();
        }
        let registry = Arc::new(registry);
        let log = Arc::new(ConversationLog::new());
        let router = CatchUpRouter::new(Arc::clone(&log), "user");
        let config = SchedulerConfig {
            tick: Duration::from_millis(10),
            stop_window: Duration::from_millis(20),
            ..Default::default()
        };
        (
            LoopScheduler::new(Arc::clone(&registry), Arc::clone(&log), router, config),
            registry,
            log,
        )
    }

    #[test]
    fn test_pick_next_excludes_last() {
        let live = handles(3);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let next = pick_next(&live, Some(ChildId::new(1)), &mut rng).unwrap();
            assert_ne!(next.id(), ChildId::new(1));
        }
    }

    #[test]
    fn test_pick_next_reaches_every_other_child() {
        let live = handles(4);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(pick_next(&live, Some(ChildId::new(0)), &mut rng).unwrap().id());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_pick_next_single_child_readdressed() {
        let live = handles(1);
        let mut rng = StdRng::seed_from_u64(1);
        let next = pick_next(&live, Some(ChildId::new(0)), &mut rng).unwrap();
        assert_eq!(next.id(), ChildId::new(0));
    }

    #[test]
    fn test_pick_next_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_next(&[], None, &mut rng).is_none());
    }

    #[tokio::test]
    async fn test_start_refused_while_talking() {
        let (scheduler, registry, log) = scheduler(&["A", "B"]);
        registry.lookup("b").unwrap().set_talking(true);

        let err = scheduler.start().await.unwrap_err();
        assert_eq!(err, SchedulerError::ChildrenTalking(vec!["B".to_string()]));
        assert!(log.is_empty());
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_start_without_children() {
        let (scheduler, _registry, log) = scheduler(&[]);
        assert_eq!(scheduler.start().await.unwrap_err(), SchedulerError::NoLiveChildren);
        assert!(log.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_then_stop() {
        let (scheduler, registry, log) = scheduler(&["A", "B"]);

        let first = scheduler.start().await.unwrap();
        assert!(scheduler.is_running());
        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].text, "continue the conversation");
        assert!(registry.lookup(first.as_str()).unwrap().is_talking());

        assert_eq!(scheduler.start().await.unwrap_err(), SchedulerError::AlreadyRunning);

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.stop().await.unwrap_err(), SchedulerError::NotRunning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_alternates_when_replies_arrive() {
        let (scheduler, registry, _log) = scheduler(&["A", "B"]);
        let first = scheduler.start().await.unwrap();
        let other = if first.matches("a") { "b" } else { "a" };

        // first child answers; the next tick must go to the other one
        registry.lookup(first.as_str()).unwrap().set_talking(false);
        tokio::time::sleep(Duration::from_millis(15)).await;

        assert!(registry.lookup(other).unwrap().is_talking());
        assert!(!registry.lookup(first.as_str()).unwrap().is_talking());

        scheduler.stop().await.unwrap();
    }
}
