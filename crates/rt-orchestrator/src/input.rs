//! Operator input
//!
//! A single reader task owns the operator's input stream and forwards each
//! line over a channel. The [`InputRouter`] is the only consumer: it
//! interprets control lines (`loop`, `stop`), targeted `name: text` lines
//! and broadcasts. Because nothing else reads the stream, no line is ever
//! lost to or duplicated by a second reader.

use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use rt_core::error::RoutingError;
use rt_core::{ChildName, Message, RtError};
use rt_protocol::ChildLineCodec;

use crate::console::Console;
use crate::log::ConversationLog;
use crate::registry::ChildRegistry;
use crate::router::CatchUpRouter;
use crate::scheduler::LoopScheduler;

/// Buffered operator lines between the reader and the router
const INPUT_CHANNEL_CAPACITY: usize = 64;

/// One interpreted operator line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand<'a> {
    /// `loop`
    StartLoop,
    /// `stop`
    StopLoop,
    /// `name: payload`
    Targeted { name: &'a str, payload: &'a str },
    /// Anything else, sent to every live child
    Broadcast(&'a str),
    /// Blank line
    Empty,
}

/// Interpret an operator line.
///
/// A target name is everything before the first colon, provided it is
/// non-empty and has no whitespace. Leading whitespace of the payload is
/// dropped.
pub fn parse_operator_line(line: &str) -> OperatorCommand<'_> {
    let line = line.trim();
    match line {
        "" => return OperatorCommand::Empty,
        "loop" => return OperatorCommand::StartLoop,
        "stop" => return OperatorCommand::StopLoop,
        _ => {}
    }

    if let Some((name, payload)) = line.split_once(':') {
        if !name.is_empty() && !name.chars().any(char::is_whitespace) {
            return OperatorCommand::Targeted {
                name,
                payload: payload.trim_start(),
            };
        }
    }

    OperatorCommand::Broadcast(line)
}

/// Start the single operator input reader.
///
/// The task ends at end of input, on a read error, on cancellation, or
/// when the receiver is dropped.
pub fn spawn_input_reader<R>(
    reader: R,
    cancel: CancellationToken,
) -> (mpsc::Receiver<String>, JoinHandle<()>)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        let mut lines = FramedRead::new(reader, ChildLineCodec::new());
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = lines.next() => next,
            };
            match next {
                Some(Ok(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Operator input read failed");
                    break;
                }
                None => {
                    tracing::debug!("Operator input closed");
                    break;
                }
            }
        }
    });

    (rx, task)
}

/// What handling one operator line did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Line was logged and sent to one child
    Targeted { child: ChildName, delivered: bool },
    /// Line was logged once and sent to the live children
    Broadcast { recipients: usize, delivered: usize },
    /// Scheduler started, first turn went to this child
    LoopStarted(ChildName),
    LoopStopped,
    /// Blank line
    Ignored,
}

/// Routes operator lines into the log and out to children
pub struct InputRouter {
    registry: Arc<ChildRegistry>,
    log: Arc<ConversationLog>,
    router: CatchUpRouter,
    scheduler: Arc<LoopScheduler>,
    console: Arc<Console>,
}

impl InputRouter {
    pub fn new(
        registry: Arc<ChildRegistry>,
        log: Arc<ConversationLog>,
        router: CatchUpRouter,
        scheduler: Arc<LoopScheduler>,
        console: Arc<Console>,
    ) -> Self {
        Self {
            registry,
            log,
            router,
            scheduler,
            console,
        }
    }

    /// Handle one operator line
    pub async fn handle_line(&self, line: &str) -> Result<RouteOutcome, RtError> {
        match parse_operator_line(line) {
            OperatorCommand::Empty => Ok(RouteOutcome::Ignored),
            OperatorCommand::StartLoop => {
                let first = self.scheduler.start().await?;
                self.console.notice(&format!("Loop started with [{}]", first));
                Ok(RouteOutcome::LoopStarted(first))
            }
            OperatorCommand::StopLoop => {
                self.scheduler.stop().await?;
                self.console.notice("Loop stopped");
                Ok(RouteOutcome::LoopStopped)
            }
            OperatorCommand::Targeted { name, payload } => self.send_to(name, payload).await,
            OperatorCommand::Broadcast(text) => Ok(self.broadcast(text).await),
        }
    }

    async fn send_to(&self, name: &str, payload: &str) -> Result<RouteOutcome, RtError> {
        let child = {
            let pending = self.log.begin(Message::operator(payload));
            match self.registry.live(name) {
                Some(child) => {
                    pending.commit();
                    Arc::clone(child)
                }
                None => {
                    pending.rollback();
                    return Err(RoutingError::UnknownChild(name.to_string()).into());
                }
            }
        };

        let delivered = match self.router.deliver(&child).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(child = %child.name(), error = %e, "Delivery failed");
                self.console.error(&e.to_string());
                false
            }
        };

        Ok(RouteOutcome::Targeted {
            child: child.name().clone(),
            delivered,
        })
    }

    async fn broadcast(&self, text: &str) -> RouteOutcome {
        self.log.append(Message::operator(text));

        let recipients = self.registry.live_children();
        let mut delivered = 0;
        for child in &recipients {
            match self.router.deliver(child).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    tracing::warn!(child = %child.name(), error = %e, "Delivery failed");
                    self.console.error(&e.to_string());
                }
            }
        }

        RouteOutcome::Broadcast {
            recipients: recipients.len(),
            delivered,
        }
    }

    /// Route lines until input ends or `cancel` fires, then stop the loop
    /// and close every child's stdin.
    pub async fn run(&self, mut lines: mpsc::Receiver<String>, cancel: CancellationToken) {
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.recv() => match line {
                    Some(line) => line,
                    None => break,
                },
            };

            if let Err(e) = self.handle_line(&line).await {
                tracing::warn!(error = %e, "Operator line rejected");
                self.console.error(&user_message(&e));
            }
        }

        if self.scheduler.is_running() {
            let _ = self.scheduler.stop().await;
        }
        self.registry.close_all_stdin().await;
        tracing::info!("Operator input finished, children's stdin closed");
    }
}

/// Error text without the category prefix
fn user_message(error: &RtError) -> String {
    match error {
        RtError::Routing(e) => e.to_string(),
        RtError::Scheduler(e) => e.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_lines() {
        assert_eq!(parse_operator_line("loop"), OperatorCommand::StartLoop);
        assert_eq!(parse_operator_line("  stop \r"), OperatorCommand::StopLoop);
        assert_eq!(parse_operator_line("   "), OperatorCommand::Empty);
        assert_eq!(parse_operator_line("Loop"), OperatorCommand::Broadcast("Loop"));
    }

    #[test]
    fn test_targeted_lines() {
        assert_eq!(
            parse_operator_line("A: hi"),
            OperatorCommand::Targeted { name: "A", payload: "hi" }
        );
        assert_eq!(
            parse_operator_line("bob:time is 10:30"),
            OperatorCommand::Targeted { name: "bob", payload: "time is 10:30" }
        );
        assert_eq!(
            parse_operator_line("B: what did A say"),
            OperatorCommand::Targeted { name: "B", payload: "what did A say" }
        );
    }

    #[test]
    fn test_not_targeted() {
        assert_eq!(
            parse_operator_line("hello everyone"),
            OperatorCommand::Broadcast("hello everyone")
        );
        assert_eq!(
            parse_operator_line("note to A: hi"),
            OperatorCommand::Broadcast("note to A: hi")
        );
        assert_eq!(parse_operator_line(":hi"), OperatorCommand::Broadcast(":hi"));
    }

    #[tokio::test]
    async fn test_input_reader_forwards_lines() {
        let (mut rx, task) =
            spawn_input_reader(&b"one\r\ntwo\nthree"[..], CancellationToken::new());

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        task.await.unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }
}
