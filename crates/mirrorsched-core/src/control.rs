//! Job control: per-job cancel tokens and the pool-wide stop signal.
//!
//! Each running job gets a [`CancelToken`]; the scheduler sets it on a hard
//! stop and the job is expected to wind down its tool invocation. The
//! [`StopSignal`] is checked once per poll tick: it is raised either by the
//! presence of a sentinel file or by an in-process [`StopHandle`] (Ctrl-C).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct TokenInner {
    canceled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation flag shared between the scheduler and one job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; wakes every task waiting in [`CancelToken::cancelled`].
    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::Acquire)
    }

    /// Resolves once [`CancelToken::cancel`] has been called (immediately if it already was).
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel() is not missed.
            let notified = self.inner.notify.notified();
            if self.is_canceled() {
                return;
            }
            notified.await;
        }
    }
}

/// Handle used outside the scheduler (e.g. a Ctrl-C task) to request a hard stop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancelToken,
}

impl StopHandle {
    pub fn request(&self) {
        tracing::info!("stop requested");
        self.token.cancel();
    }
}

/// Pool-wide stop request: sentinel file and/or in-process request.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    sentinel: Option<PathBuf>,
    token: CancelToken,
}

impl StopSignal {
    /// Stop signal that only reacts to in-process requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop signal that is also raised while `path` exists.
    pub fn with_sentinel(path: impl Into<PathBuf>) -> Self {
        Self {
            sentinel: Some(path.into()),
            token: CancelToken::new(),
        }
    }

    pub fn sentinel(&self) -> Option<&Path> {
        self.sentinel.as_deref()
    }

    pub fn handle(&self) -> StopHandle {
        StopHandle {
            token: self.token.clone(),
        }
    }

    /// True if a stop was requested in-process or the sentinel file exists.
    pub fn is_requested(&self) -> bool {
        if self.token.is_canceled() {
            return true;
        }
        match &self.sentinel {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "stop file present");
                true
            }
            _ => false,
        }
    }

    /// Resolves on an in-process stop request. The sentinel file is not
    /// watched; it is picked up by the next poll tick.
    pub async fn requested(&self) {
        self.token.cancelled().await;
    }
}
