pub mod app;
pub mod background;
pub mod channel;
pub mod config;
pub mod events;
pub mod server;
pub mod shutdown;

use config::AppConfig;

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load and validate runtime configuration.
pub fn init_foundation() -> Result<AppConfig, anyhow::Error> {
    load_dotenv();

    let config = AppConfig::load()?;
    tracing::info!(
        port = config.server_port,
        channel = %config.pipeline.channel_name,
        method = %config.pipeline.tap_method,
        launch_policy = config.pipeline.launch_policy.as_str(),
        "Settings loaded"
    );
    Ok(config)
}
