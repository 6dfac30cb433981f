//! Notification intake coordinator.
//!
//! Classifies OS / messaging-SDK callbacks and drives the pipeline:
//! user taps go through dedup, normalization and the readiness gate;
//! foreground and background deliveries are only acknowledged; token
//! refreshes are broadcast.
//!
//! Every OS-facing handler takes a completion callback that is invoked
//! exactly once with the [`Acknowledgment`], independently of the
//! [`IntakeOutcome`] it returns.

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::{LaunchPolicy, PipelineConfig};
use crate::dedup::DeliveryDeduplicator;
use crate::dispatch::{Dispatcher, MethodChannel};
use crate::gate::{ReadinessGate, Submission};
use crate::payload::{RawNotification, normalize};
use crate::token::{TokenBroadcaster, TokenEvent};

/// Inbound method sent by the application layer once its splash screen is gone.
pub const SPLASH_FINISHED_METHOD: &str = "splashScreenFinished";

/// How a foreground notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresentationOptions {
    pub banner: bool,
    pub alert: bool,
    pub sound: bool,
}

impl PresentationOptions {
    pub fn banner_and_sound() -> Self {
        Self {
            banner: true,
            alert: false,
            sound: true,
        }
    }

    pub fn alert_and_sound() -> Self {
        Self {
            banner: false,
            alert: true,
            sound: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchResult {
    /// Deliveries are always reported as carrying new data.
    NewData,
}

/// Signal returned to the OS for one callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum Acknowledgment {
    Present(PresentationOptions),
    Background(FetchResult),
    Completed,
}

/// What the pipeline did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// Acknowledged to the OS; processing waits for a tap.
    AcknowledgedOnly,
    /// Launch notification kept for diagnostics.
    Recorded,
    Suppressed,
    Dispatched,
    Deferred { replaced: bool },
    Dropped,
    ShutDown,
}

impl From<Submission> for IntakeOutcome {
    fn from(submission: Submission) -> Self {
        match submission {
            Submission::Delivered => Self::Dispatched,
            Submission::Dropped => Self::Dropped,
            Submission::Deferred { replaced } => Self::Deferred { replaced },
        }
    }
}

/// Everything attached to the launch context.
#[derive(Debug, Clone, Default)]
pub struct LaunchContext {
    pub notification: Option<RawNotification>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchRecord {
    pub notification: Option<RawNotification>,
    pub url: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Reply to an inbound method call from the application layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum MethodReply {
    Success(Value),
    NotImplemented,
}

/// Diagnostics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeStats {
    pub ready: bool,
    pub attached: bool,
    pub shut_down: bool,
    pub pending: bool,
    pub last_handled_id: Option<String>,
    pub dispatched: u64,
    pub dropped: u64,
    pub suppressed: u64,
    pub deferred: u64,
    pub acknowledged_only: u64,
    pub registration_failures: u64,
    pub device_token: Option<String>,
    pub splash_finished: bool,
    pub last_launch: Option<LaunchRecord>,
}

struct IntakeState {
    dedup: DeliveryDeduplicator,
    gate: ReadinessGate,
    shut_down: bool,
    suppressed: u64,
    deferred: u64,
    acknowledged_only: u64,
    registration_failures: u64,
    device_token: Option<String>,
    splash_finished: bool,
    last_launch: Option<LaunchRecord>,
}

/// Coordinator instance. Lifecycle: [`new`](Self::new) →
/// [`attach_receiver`](Self::attach_receiver) → [`shutdown`](Self::shutdown).
///
/// All mutable state sits behind one mutex, so callbacks from any thread
/// are serialized and each runs to completion.
pub struct NotificationIntake {
    config: PipelineConfig,
    state: Mutex<IntakeState>,
    tokens: TokenBroadcaster,
}

impl NotificationIntake {
    pub fn new(config: PipelineConfig) -> Self {
        let dispatcher = Dispatcher::new(config.tap_method.clone());
        let tokens = TokenBroadcaster::new(config.token_capacity);
        Self {
            state: Mutex::new(IntakeState {
                dedup: DeliveryDeduplicator::new(),
                gate: ReadinessGate::new(dispatcher),
                shut_down: false,
                suppressed: 0,
                deferred: 0,
                acknowledged_only: 0,
                registration_failures: 0,
                device_token: None,
                splash_finished: false,
                last_launch: None,
            }),
            tokens,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, IntakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The application layer can now accept method calls.
    ///
    /// Attaching again swaps the channel; readiness is already set.
    pub fn attach_receiver(&self, channel: Arc<dyn MethodChannel>) {
        let mut state = self.state();
        if state.shut_down {
            tracing::warn!("Receiver attached after shutdown, ignoring");
            return;
        }
        state.gate.dispatcher_mut().attach(channel);
        if let Some(flushed) = state.gate.on_ready() {
            tracing::info!(outcome = ?flushed, "Held notification flushed on attach");
        }
    }

    /// Stop dispatching. A held notification is discarded.
    pub fn shutdown(&self) {
        let mut state = self.state();
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        let discarded = state.gate.discard_pending();
        state.gate.dispatcher_mut().detach();
        tracing::info!(discarded, "Notification intake shut down");
    }

    pub fn is_ready(&self) -> bool {
        self.state().gate.is_ready()
    }

    /// App launched with a notification and/or URL in its launch context.
    pub fn on_launch(&self, launch: LaunchContext) -> IntakeOutcome {
        let mut state = self.state();

        if let Some(url) = &launch.url {
            tracing::info!(url = %url, "Launch URL found");
        }
        if launch.notification.is_some() {
            tracing::info!(
                policy = self.config.launch_policy.as_str(),
                "Launched from notification"
            );
        }

        let forward = match (&launch.notification, self.config.launch_policy) {
            (Some(raw), LaunchPolicy::Forward) => Some(raw.clone()),
            _ => None,
        };

        state.last_launch = Some(LaunchRecord {
            notification: launch.notification,
            url: launch.url,
            recorded_at: Utc::now(),
        });

        match forward {
            Some(raw) => Self::process_interaction(&mut state, &raw),
            None => IntakeOutcome::Recorded,
        }
    }

    /// Notification arriving while the UI is visible.
    pub fn will_present<F>(&self, raw: &RawNotification, complete: F) -> IntakeOutcome
    where
        F: FnOnce(Acknowledgment),
    {
        tracing::info!(entries = raw.len(), "Notification received in foreground");
        self.state().acknowledged_only += 1;

        let options = if self.config.legacy_alert {
            PresentationOptions::alert_and_sound()
        } else {
            PresentationOptions::banner_and_sound()
        };
        complete(Acknowledgment::Present(options));
        IntakeOutcome::AcknowledgedOnly
    }

    /// Silent delivery without a tap.
    pub fn did_receive_background<F>(&self, raw: &RawNotification, complete: F) -> IntakeOutcome
    where
        F: FnOnce(Acknowledgment),
    {
        tracing::info!(entries = raw.len(), "Notification received in background");
        self.state().acknowledged_only += 1;
        complete(Acknowledgment::Background(FetchResult::NewData));
        IntakeOutcome::AcknowledgedOnly
    }

    /// User tapped a delivered notification.
    pub fn did_receive_response<F>(&self, raw: &RawNotification, complete: F) -> IntakeOutcome
    where
        F: FnOnce(Acknowledgment),
    {
        tracing::info!(
            delivery_id = raw.delivery_id().unwrap_or("-"),
            "Notification tapped"
        );
        let outcome = {
            let mut state = self.state();
            Self::process_interaction(&mut state, raw)
        };
        complete(Acknowledgment::Completed);
        outcome
    }

    fn process_interaction(state: &mut IntakeState, raw: &RawNotification) -> IntakeOutcome {
        if state.shut_down {
            tracing::debug!("Tap after shutdown, not dispatched");
            return IntakeOutcome::ShutDown;
        }
        if state.dedup.should_suppress(raw) {
            state.suppressed += 1;
            return IntakeOutcome::Suppressed;
        }

        let canonical = normalize(raw, true);
        let submission = state.gate.submit(canonical);
        if matches!(submission, Submission::Deferred { .. }) {
            state.deferred += 1;
        }
        submission.into()
    }

    /// Messaging SDK issued a new registration token.
    pub fn on_token_refresh(&self, token: Option<&str>) -> usize {
        tracing::info!(present = token.is_some(), "Messaging token refreshed");
        self.tokens.emit(token)
    }

    pub fn subscribe_tokens(&self) -> broadcast::Receiver<TokenEvent> {
        self.tokens.subscribe()
    }

    /// Push transport issued a device token. Returns its hex form.
    pub fn device_token_registered(&self, token: &[u8]) -> String {
        let encoded = hex::encode(token);
        tracing::info!(device_token = %encoded, "Device token registered");
        self.state().device_token = Some(encoded.clone());
        encoded
    }

    /// Push registration failed; logged only, no retry.
    pub fn registration_failed(&self, reason: &str) {
        tracing::error!(reason = %reason, "Failed to register for remote notifications");
        self.state().registration_failures += 1;
    }

    /// Method call from the application layer on the shared channel.
    pub fn handle_method_call(&self, method: &str) -> MethodReply {
        match method {
            SPLASH_FINISHED_METHOD => {
                tracing::info!("Splash screen finished");
                self.state().splash_finished = true;
                MethodReply::Success(Value::Null)
            }
            other => {
                tracing::debug!(method = %other, "Unhandled channel method");
                MethodReply::NotImplemented
            }
        }
    }

    pub fn stats(&self) -> IntakeStats {
        let state = self.state();
        let dispatcher = state.gate.dispatcher();
        IntakeStats {
            ready: state.gate.is_ready(),
            attached: dispatcher.is_attached(),
            shut_down: state.shut_down,
            pending: state.gate.pending().is_some(),
            last_handled_id: state.dedup.last_handled().map(str::to_string),
            dispatched: dispatcher.dispatched(),
            dropped: dispatcher.dropped(),
            suppressed: state.suppressed,
            deferred: state.deferred,
            acknowledged_only: state.acknowledged_only,
            registration_failures: state.registration_failures,
            device_token: state.device_token.clone(),
            splash_finished: state.splash_finished,
            last_launch: state.last_launch.clone(),
        }
    }
}
