//! Single-slot duplicate delivery suppression.

use crate::payload::RawNotification;

/// Remembers only the immediately preceding delivery identifier.
#[derive(Debug, Default)]
pub struct DeliveryDeduplicator {
    last_handled: Option<String>,
}

impl DeliveryDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `raw` repeats the last handled delivery.
    ///
    /// Payloads without an identifier are never suppressed. A payload with a
    /// new identifier replaces the remembered one.
    pub fn should_suppress(&mut self, raw: &RawNotification) -> bool {
        let Some(id) = raw.delivery_id() else {
            return false;
        };

        if self.last_handled.as_deref() == Some(id) {
            tracing::info!(delivery_id = %id, "Duplicate delivery suppressed");
            return true;
        }

        self.last_handled = Some(id.to_string());
        false
    }

    pub fn last_handled(&self) -> Option<&str> {
        self.last_handled.as_deref()
    }
}
