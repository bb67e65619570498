//! Ctrl+C / SIGTERM handling
//!
//! The first signal ends operator input, which closes every child's stdin
//! and lets the children wind down. A second signal exits at once, for
//! children that ignore end of input.

use tokio_util::sync::CancellationToken;

use crate::exit;

/// What a received signal should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Input was cancelled; keep waiting for the children
    WindDown,
    /// Already winding down; exit with this code
    Exit(i32),
}

/// Escalate one received signal against the run's cancellation token
pub fn escalate(cancel: &CancellationToken) -> SignalAction {
    if cancel.is_cancelled() {
        SignalAction::Exit(exit::INTERRUPTED)
    } else {
        cancel.cancel();
        SignalAction::WindDown
    }
}

/// Listen for signals for the rest of the process's life
pub fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut terminate =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => Some(signal),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                    None
                }
            };

        loop {
            #[cfg(unix)]
            let terminated = async {
                match terminate.as_mut() {
                    Some(signal) => {
                        signal.recv().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            #[cfg(not(unix))]
            let terminated = std::future::pending::<()>();

            let name = tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => "Ctrl+C",
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
                        return;
                    }
                },
                _ = terminated => "SIGTERM",
            };

            match escalate(&cancel) {
                SignalAction::WindDown => {
                    tracing::info!(signal = name, "Closing children's input, repeat to exit now");
                }
                SignalAction::Exit(code) => {
                    tracing::warn!(signal = name, "Exiting without waiting for children");
                    std::process::exit(code);
                }
            }
        }
    });
}
