//! Process supervisor
//!
//! Spawns one OS process per child spec with piped stdio, registers it, and
//! starts its output pumps. Children are never killed: shutdown waits for
//! each to exit on its own, closes the pipes, then drains the pumps.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use rt_core::config::ChildSpec;
use rt_core::error::SpawnError;
use rt_core::{ChildName, ConsoleColor};

use crate::console::{Console, StreamKind};
use crate::log::ConversationLog;
use crate::pump::spawn_pump;
use crate::registry::{ChildHandle, ChildRegistry};

/// Windows `CREATE_NO_WINDOW` process creation flag
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Exit code recorded for a child that ended without one (signal, wait failure)
pub const ABNORMAL_EXIT_CODE: i32 = 1;

struct Supervised {
    handle: Arc<ChildHandle>,
    process: Child,
    pumps: Vec<JoinHandle<usize>>,
}

/// How one child ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildExit {
    pub name: ChildName,
    pub code: i32,
}

/// Result of [`Supervisor::shutdown`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Last non-zero child exit code in registration order, else 0
    pub exit_code: i32,
    /// Every child's exit, in registration order
    pub exits: Vec<ChildExit>,
    /// Lines read by all pumps
    pub lines: usize,
}

/// Owns the child processes for one run
pub struct Supervisor {
    children: Vec<Supervised>,
    console: Arc<Console>,
}

impl Supervisor {
    /// Spawn every child in order.
    ///
    /// A child that fails to start is reported and left out; the caller
    /// decides whether an empty registry is fatal.
    pub fn spawn_all(
        specs: &[ChildSpec],
        log: Arc<ConversationLog>,
        console: Arc<Console>,
    ) -> (ChildRegistry, Supervisor) {
        let mut registry = ChildRegistry::new();
        let mut children = Vec::with_capacity(specs.len());

        for spec in specs {
            match spawn_child(spec, &mut registry, &log, &console) {
                Ok(child) => {
                    let visibility = if spec.show_window { "shown" } else { "hidden" };
                    console.notice(&format!(
                        "Spawned [{}] {} (window {})",
                        spec.name, spec.cmd, visibility
                    ));
                    tracing::info!(child = %spec.name, cmd = %spec.cmd, pid = ?child.process.id(), "Child spawned");
                    children.push(child);
                }
                Err(e) => {
                    tracing::warn!(child = %spec.name, error = %e, "Failed to spawn child");
                    console.error(&e.to_string());
                }
            }
        }

        (registry, Supervisor { children, console })
    }

    /// Number of children that started
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Wait for every child to exit, close their stdin, drain the pumps
    pub async fn shutdown(mut self) -> ShutdownReport {
        let mut exits = Vec::with_capacity(self.children.len());

        for child in &mut self.children {
            let code = exit_code(child.process.wait().await);
            child.handle.mark_exited();
            tracing::info!(child = %child.handle.name(), code, "Child exited");
            if code != 0 {
                self.console
                    .notice(&format!("[{}] exited with code {}", child.handle.name(), code));
            }
            exits.push(ChildExit {
                name: child.handle.name().clone(),
                code,
            });
        }

        for child in &self.children {
            child.handle.close_stdin().await;
        }

        let mut lines = 0;
        for child in self.children.drain(..) {
            for pump in child.pumps {
                match pump.await {
                    Ok(count) => lines += count,
                    Err(e) => tracing::warn!(child = %child.handle.name(), error = %e, "Pump task failed"),
                }
            }
        }

        ShutdownReport {
            exit_code: last_nonzero_exit(exits.iter().map(|e| e.code)),
            exits,
            lines,
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("children", &self.children.len())
            .finish()
    }
}

fn spawn_child(
    spec: &ChildSpec,
    registry: &mut ChildRegistry,
    log: &Arc<ConversationLog>,
    console: &Arc<Console>,
) -> Result<Supervised, SpawnError> {
    if registry.lookup(&spec.name).is_some() {
        return Err(SpawnError::DuplicateName(spec.name.clone()));
    }

    let (process, stdin, stdout, stderr) = launch(spec)?;
    let color: Option<ConsoleColor> = spec.display_color();
    let handle = registry.register(ChildName::new(spec.name.clone()), color, stdin)?;

    let pumps = vec![
        spawn_pump(
            Arc::clone(&handle),
            stdout,
            StreamKind::Stdout,
            Arc::clone(log),
            Arc::clone(console),
        ),
        spawn_pump(
            Arc::clone(&handle),
            stderr,
            StreamKind::Stderr,
            Arc::clone(log),
            Arc::clone(console),
        ),
    ];

    Ok(Supervised {
        handle,
        process,
        pumps,
    })
}

fn launch(spec: &ChildSpec) -> Result<(Child, ChildStdin, ChildStdout, ChildStderr), SpawnError> {
    let mut command = Command::new(&spec.cmd);
    command
        .args(spec.args.to_vec())
        .envs(&spec.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }

    #[cfg(windows)]
    if !spec.show_window {
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let mut process = command.spawn().map_err(|source| SpawnError::Launch {
        name: spec.name.clone(),
        cmd: spec.cmd.clone(),
        source,
    })?;

    let missing = |pipe| SpawnError::MissingPipe {
        name: spec.name.clone(),
        pipe,
    };
    let stdin = process.stdin.take().ok_or_else(|| missing("stdin"))?;
    let stdout = process.stdout.take().ok_or_else(|| missing("stdout"))?;
    let stderr = process.stderr.take().ok_or_else(|| missing("stderr"))?;

    Ok((process, stdin, stdout, stderr))
}

fn exit_code(status: std::io::Result<ExitStatus>) -> i32 {
    match status {
        Ok(status) => status.code().unwrap_or(ABNORMAL_EXIT_CODE),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to wait for child");
            ABNORMAL_EXIT_CODE
        }
    }
}

/// The run's exit code: the last non-zero code, else 0
pub fn last_nonzero_exit<I>(codes: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    codes.into_iter().filter(|c| *c != 0).last().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_nonzero_exit() {
        assert_eq!(last_nonzero_exit([0, 0, 0]), 0);
        assert_eq!(last_nonzero_exit([]), 0);
        assert_eq!(last_nonzero_exit([3, 0, 5, 0]), 5);
        assert_eq!(last_nonzero_exit([0, 7]), 7);
    }

    #[test]
    fn test_wait_failure_counts_as_abnormal() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "gone");
        assert_eq!(exit_code(Err(err)), ABNORMAL_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_missing_executable_is_skipped() {
        let specs = vec![ChildSpec::new("ghost", "round-table-no-such-binary-xyz")];
        let (registry, supervisor) = Supervisor::spawn_all(
            &specs,
            Arc::new(ConversationLog::new()),
            Arc::new(Console::silent()),
        );
        assert!(registry.is_empty());
        assert!(supervisor.is_empty());
        assert_eq!(supervisor.shutdown().await.exit_code, 0);
    }
}
