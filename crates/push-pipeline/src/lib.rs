//! Push notification intake pipeline.
//!
//! Normalizes raw OS / messaging-SDK payloads into one canonical shape,
//! suppresses repeat deliveries, holds a notification until the
//! application layer attaches, and hands it across a method channel.

pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod gate;
pub mod intake;
pub mod payload;
pub mod token;

pub use config::{ConfigError, LaunchPolicy, PipelineConfig};
pub use dedup::DeliveryDeduplicator;
pub use dispatch::{DispatchError, Dispatcher, MethodChannel};
pub use gate::{ReadinessGate, Submission};
pub use intake::{
    Acknowledgment, FetchResult, IntakeOutcome, IntakeStats, LaunchContext, LaunchRecord,
    MethodReply, NotificationIntake, PresentationOptions,
};
pub use payload::{CanonicalNotification, PayloadShape, RawNotification, normalize};
pub use token::{TOKEN_EVENT_NAME, TokenBroadcaster, TokenEvent, TokenPayload};
