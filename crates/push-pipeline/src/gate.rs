//! Readiness gate: holds one notification until the receiver attaches.

use crate::dispatch::Dispatcher;
use crate::payload::CanonicalNotification;

/// Result of handing a notification to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Delivered,
    /// Dispatch was attempted but the channel did not accept it.
    Dropped,
    /// Stored in the pending slot; `replaced` is set when an older
    /// notification was overwritten.
    Deferred { replaced: bool },
}

pub struct ReadinessGate {
    ready: bool,
    pending: Option<CanonicalNotification>,
    dispatcher: Dispatcher,
}

impl ReadinessGate {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            ready: false,
            pending: None,
            dispatcher,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending(&self) -> Option<&CanonicalNotification> {
        self.pending.as_ref()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn submit(&mut self, notification: CanonicalNotification) -> Submission {
        if self.ready {
            return if self.dispatcher.dispatch(&notification) {
                Submission::Delivered
            } else {
                Submission::Dropped
            };
        }

        let replaced = self.pending.replace(notification).is_some();
        tracing::info!(replaced, "Receiver not ready, notification held");
        Submission::Deferred { replaced }
    }

    /// Mark the receiver ready and flush the pending slot.
    ///
    /// Readiness never reverts. Returns the flush result, or `None` when the
    /// slot was empty.
    pub fn on_ready(&mut self) -> Option<Submission> {
        if !self.ready {
            self.ready = true;
            tracing::info!("Receiver ready");
        }

        let pending = self.pending.take()?;
        tracing::info!("Flushing held notification");
        Some(if self.dispatcher.dispatch(&pending) {
            Submission::Delivered
        } else {
            Submission::Dropped
        })
    }

    /// Discard the pending slot without dispatching.
    pub fn discard_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
