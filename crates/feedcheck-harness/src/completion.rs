//! Single-resolution completion signal for async cases and hooks.

use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// How an async body declared itself finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The body completed normally
    Complete,
    /// The body reported a fault through [`Done::fail`]
    Fail(String),
}

/// Completion handle passed to async case and hook bodies.
///
/// Clones share one underlying sender: the first [`complete`](Self::complete)
/// or [`fail`](Self::fail) resolves the body, later calls are no-ops. A call
/// after the runner stopped listening (timeout) is silently ignored.
#[derive(Debug, Clone)]
pub struct Done {
    /// Sender, taken on first resolution
    sender: Arc<Mutex<Option<oneshot::Sender<Signal>>>>,
}

/// Receiving side of a [`Done`] handle, held by the runner.
pub type Completion = oneshot::Receiver<Signal>;

impl Done {
    /// Create a handle together with the receiver the runner awaits.
    #[must_use]
    pub fn pair() -> (Self, Completion) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Arc::new(Mutex::new(Some(sender))),
            },
            receiver,
        )
    }

    /// Declare the body finished.
    pub fn complete(&self) {
        self.resolve(Signal::Complete);
    }

    /// Declare the body faulted with `reason`.
    pub fn fail(&self, reason: impl Into<String>) {
        self.resolve(Signal::Fail(reason.into()));
    }

    /// Whether this handle (or a clone) has already been resolved.
    pub fn is_resolved(&self) -> bool {
        self.sender.lock().is_ok_and(|sender| sender.is_none())
    }

    fn resolve(&self, signal: Signal) {
        let Ok(mut slot) = self.sender.lock() else {
            return;
        };
        let Some(sender) = slot.take() else {
            tracing::debug!("Completion signal already resolved, ignoring {signal:?}");
            return;
        };
        if sender.send(signal).is_err() {
            tracing::debug!("Completion arrived after the runner moved on");
        }
    }
}
