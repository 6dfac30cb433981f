//! Pipeline configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANNEL_NAME: &str = "app.channel.shared.data";
pub const DEFAULT_TAP_METHOD: &str = "onNotificationTap";
const DEFAULT_TOKEN_CAPACITY: usize = 16;
/// Upper bound for [`PipelineConfig::token_capacity`].
pub const MAX_TOKEN_CAPACITY: usize = 4096;

/// What to do with a notification attached to the launch context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchPolicy {
    /// Keep it as a diagnostics record only.
    #[default]
    Record,
    /// Treat it as a user tap and run it through the pipeline.
    Forward,
}

impl LaunchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Forward => "forward",
        }
    }
}

impl FromStr for LaunchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "record" => Ok(Self::Record),
            "forward" => Ok(Self::Forward),
            other => Err(ConfigError::InvalidLaunchPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid launch policy '{0}' (expected 'record' or 'forward')")]
    InvalidLaunchPolicy(String),

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("token_capacity must be between 1 and 4096, got {0}")]
    InvalidCapacity(usize),
}

/// Settings for a [`NotificationIntake`](crate::NotificationIntake).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the channel shared with the application layer.
    pub channel_name: String,
    /// Method invoked on that channel for every accepted tap.
    pub tap_method: String,
    pub launch_policy: LaunchPolicy,
    /// Present foreground notifications as `alert` instead of `banner`.
    pub legacy_alert: bool,
    /// Buffer size of the token broadcast channel.
    pub token_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL_NAME.into(),
            tap_method: DEFAULT_TAP_METHOD.into(),
            launch_policy: LaunchPolicy::Record,
            legacy_alert: false,
            token_capacity: DEFAULT_TOKEN_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_name.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "channel_name",
            });
        }
        if self.tap_method.trim().is_empty() {
            return Err(ConfigError::Empty { field: "tap_method" });
        }
        if !(1..=MAX_TOKEN_CAPACITY).contains(&self.token_capacity) {
            return Err(ConfigError::InvalidCapacity(self.token_capacity));
        }
        Ok(())
    }
}
