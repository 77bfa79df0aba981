//! Cooperative cancellation.
//!
//! DESIGN
//! ======
//! The flag is the only state shared between the signal observer task and the
//! session. It is read at checkpoints (phase boundaries, before each batch,
//! at the top of each poll attempt) and never interrupts an in-flight socket
//! read or write. The inter-poll sleep is the one wait that wakes early.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<FlagInner>,
}

#[derive(Default)]
struct FlagInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `true` only for the first request.
    pub fn cancel(&self) -> bool {
        let first = !self.inner.cancelled.swap(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
        first
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless cancelled first. Returns `true` if cancelled.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return true;
        }

        tokio::select! {
            () = tokio::time::sleep(duration) => self.is_cancelled(),
            () = notified => true,
        }
    }
}

impl std::fmt::Debug for CancellationFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationFlag")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Spawn the task that turns the first SIGTERM or Ctrl-C into a cancellation.
pub fn spawn_signal_listener(flag: CancellationFlag) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "shutdown signal received");
                flag.cancel();
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to install shutdown signal handler");
            }
        }
    })
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = terminate.recv() => Ok("SIGTERM"),
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}

#[cfg(test)]
#[path = "cancel_test.rs"]
mod tests;
