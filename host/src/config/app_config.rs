//! Runtime configuration loaded from the environment.

use push_pipeline::PipelineConfig;

use super::validation::validate_setting;

pub const SERVER_PORT: &str = "SERVER_PORT";
pub const PUSH_CHANNEL_NAME: &str = "PUSH_CHANNEL_NAME";
pub const PUSH_TAP_METHOD: &str = "PUSH_TAP_METHOD";
pub const PUSH_LAUNCH_POLICY: &str = "PUSH_LAUNCH_POLICY";
pub const PUSH_LEGACY_ALERT: &str = "PUSH_LEGACY_ALERT";

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn load() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Empty values fall back to
    /// defaults; non-empty values must pass validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let g = |key: &str| -> Result<Option<String>, anyhow::Error> {
            let Some(value) = lookup(key).map(|v| v.trim().to_string()) else {
                return Ok(None);
            };
            if value.is_empty() {
                return Ok(None);
            }
            validate_setting(key, &value)
                .map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;
            Ok(Some(value))
        };

        let mut config = Self::default();

        if let Some(v) = g(SERVER_PORT)? {
            config.server_port = v.parse()?;
        }
        if let Some(v) = g(PUSH_CHANNEL_NAME)? {
            config.pipeline.channel_name = v;
        }
        if let Some(v) = g(PUSH_TAP_METHOD)? {
            config.pipeline.tap_method = v;
        }
        if let Some(v) = g(PUSH_LAUNCH_POLICY)? {
            config.pipeline.launch_policy = v.parse()?;
        }
        if let Some(v) = g(PUSH_LEGACY_ALERT)? {
            config.pipeline.legacy_alert = v == "true";
        }

        config.pipeline.validate()?;
        Ok(config)
    }
}
