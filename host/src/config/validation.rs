//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

static RE_CHANNEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)*$").unwrap());
static RE_METHOD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "SERVER_PORT" => {
            let v: u16 = value.parse().map_err(|_| "must be an integer between 1 and 65535")?;
            if v == 0 {
                return Err("must be between 1 and 65535".into());
            }
        }
        "PUSH_CHANNEL_NAME" => {
            if !RE_CHANNEL_NAME.is_match(value) {
                return Err(
                    "must be dot-separated identifiers (e.g. app.channel.shared.data)".into(),
                );
            }
        }
        "PUSH_TAP_METHOD" => {
            if !RE_METHOD_NAME.is_match(value) {
                return Err("must be a single identifier".into());
            }
        }
        "PUSH_LAUNCH_POLICY" => {
            value
                .parse::<push_pipeline::LaunchPolicy>()
                .map_err(|e| e.to_string())?;
        }
        "PUSH_LEGACY_ALERT" => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}
