pub mod classify;
pub mod config_cmd;
pub mod doctor;
pub mod handle;
pub mod tools;

use std::path::Path;

use deskpilot_config::AppConfig;
use tracing::debug;

/// Load config from `path` if given, else from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    debug!(path = ?path, "Loading config");
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .map_err(|e| format!("Failed to load config: {e}"))?;
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?,
    };
    Ok(config)
}
