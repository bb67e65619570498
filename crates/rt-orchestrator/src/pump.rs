//! Output pumps
//!
//! Two per child, one each for stdout and stderr. A pump reads lines until
//! the stream closes, logging and rendering each one. Read errors end the
//! pump quietly; the child is then treated as gone.

use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;

use rt_core::Message;
use rt_protocol::ChildLineCodec;

use crate::console::{Console, StreamKind};
use crate::log::ConversationLog;
use crate::registry::ChildHandle;

/// Start a pump task. Resolves to the number of lines read.
pub fn spawn_pump<R>(
    child: Arc<ChildHandle>,
    reader: R,
    stream: StreamKind,
    log: Arc<ConversationLog>,
    console: Arc<Console>,
) -> JoinHandle<usize>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move { run_pump(&child, reader, stream, &log, &console).await })
}

/// Drive one pump to completion on the current task
pub async fn run_pump<R>(
    child: &ChildHandle,
    reader: R,
    stream: StreamKind,
    log: &ConversationLog,
    console: &Console,
) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(reader, ChildLineCodec::new());
    let mut count = 0;

    while let Some(next) = lines.next().await {
        let line = match next {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(
                    child = %child.name(),
                    stream = stream.as_str(),
                    error = %e,
                    "Pump read failed"
                );
                break;
            }
        };

        tracing::trace!(child = %child.name(), stream = stream.as_str(), %line, "Child line");
        log.append(Message::child(child.name().clone(), line.clone()));
        child.set_talking(false);
        console.child_line(child.name().as_str(), stream, child.color(), &line);
        count += 1;
    }

    if stream == StreamKind::Stdout {
        child.mark_exited();
    }
    tracing::debug!(child = %child.name(), stream = stream.as_str(), lines = count, "Pump finished");
    count
}
