//! Hand-off of canonical notifications to the application layer.

use std::sync::Arc;

use serde_json::Value;

use crate::payload::CanonicalNotification;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no receiver attached")]
    Detached,

    #[error("receiver closed: {0}")]
    Closed(String),
}

/// One-way method call into the embedded application runtime.
///
/// Implementations must not call back into the intake synchronously.
pub trait MethodChannel: Send + Sync {
    fn invoke(&self, method: &str, arguments: Value) -> Result<(), DispatchError>;
}

/// Invokes a single named method per delivery; failures are logged and dropped.
pub struct Dispatcher {
    method: String,
    channel: Option<Arc<dyn MethodChannel>>,
    dispatched: u64,
    dropped: u64,
}

impl Dispatcher {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            channel: None,
            dispatched: 0,
            dropped: 0,
        }
    }

    pub fn attach(&mut self, channel: Arc<dyn MethodChannel>) {
        self.channel = Some(channel);
    }

    pub fn detach(&mut self) -> Option<Arc<dyn MethodChannel>> {
        self.channel.take()
    }

    pub fn is_attached(&self) -> bool {
        self.channel.is_some()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Fire-and-forget. Returns whether the channel accepted the call.
    pub fn dispatch(&mut self, notification: &CanonicalNotification) -> bool {
        let result = match &self.channel {
            Some(channel) => channel.invoke(&self.method, notification.to_value()),
            None => Err(DispatchError::Detached),
        };

        match result {
            Ok(()) => {
                self.dispatched += 1;
                tracing::info!(
                    method = %self.method,
                    notification_type = ?notification.notification_type(),
                    "Notification dispatched"
                );
                true
            }
            Err(e) => {
                self.dropped += 1;
                tracing::warn!(method = %self.method, error = %e, "Notification dropped");
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Channel double that records every call.
    #[derive(Default)]
    pub struct RecordingChannel {
        calls: Mutex<Vec<(String, Value)>>,
        closed: bool,
    }

    impl RecordingChannel {
        pub fn closed() -> Self {
            Self {
                closed: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl MethodChannel for RecordingChannel {
        fn invoke(&self, method: &str, arguments: Value) -> Result<(), DispatchError> {
            if self.closed {
                return Err(DispatchError::Closed("test channel closed".into()));
            }
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), arguments));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::testing::RecordingChannel;
    use super::*;
    use crate::payload::{RawNotification, normalize};

    fn sample() -> CanonicalNotification {
        let mut map = Map::new();
        map.insert("type".into(), json!("promo"));
        normalize(&RawNotification::from(map), true)
    }

    #[test]
    fn dispatch_invokes_named_method() {
        let channel = Arc::new(RecordingChannel::default());
        let mut dispatcher = Dispatcher::new("onNotificationTap");
        dispatcher.attach(channel.clone());

        assert!(dispatcher.dispatch(&sample()));
        assert_eq!(
            channel.calls(),
            vec![(
                "onNotificationTap".to_string(),
                json!({"type": "promo", "wasUserInteraction": true})
            )]
        );
        assert_eq!(dispatcher.dispatched(), 1);
    }

    #[test]
    fn dispatch_without_receiver_is_dropped() {
        let mut dispatcher = Dispatcher::new("onNotificationTap");
        assert!(!dispatcher.dispatch(&sample()));
        assert_eq!(dispatcher.dropped(), 1);
        assert_eq!(dispatcher.dispatched(), 0);
    }

    #[test]
    fn closed_receiver_is_dropped_not_raised() {
        let mut dispatcher = Dispatcher::new("onNotificationTap");
        dispatcher.attach(Arc::new(RecordingChannel::closed()));
        assert!(!dispatcher.dispatch(&sample()));
        assert_eq!(dispatcher.dropped(), 1);
    }

    #[test]
    fn detach_returns_channel() {
        let mut dispatcher = Dispatcher::new("m");
        dispatcher.attach(Arc::new(RecordingChannel::default()));
        assert!(dispatcher.is_attached());
        assert!(dispatcher.detach().is_some());
        assert!(!dispatcher.is_attached());
    }
}
