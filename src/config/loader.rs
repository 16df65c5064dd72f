//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{FantasyError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. `YAHOO_*` environment variables (session secrets)
/// 2. Environment variables (prefixed with APP__)
/// 3. Configuration file (TOML format)
/// 4. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    // Secrets usually live in a .env file next to the config
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| FantasyError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| FantasyError::Configuration(e.to_string()))?;

    apply_yahoo_env(&mut app, |key| std::env::var(key).ok());
    Ok(app)
}

/// Overlay the `YAHOO_*` secret variables onto a loaded configuration
///
/// `lookup` is the environment; tests pass a closure over a map.
pub fn apply_yahoo_env<F>(app: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let yahoo = &mut app.yahoo;
    let slots: [(&str, &mut Option<String>); 5] = [
        ("YAHOO_COOKIE", &mut yahoo.cookie),
        ("YAHOO_CRUMB", &mut yahoo.crumb),
        ("YAHOO_CLIENT_ID", &mut yahoo.client_id),
        ("YAHOO_CLIENT_SECRET", &mut yahoo.client_secret),
        ("YAHOO_REFRESH_TOKEN", &mut yahoo.refresh_token),
    ];

    for (key, slot) in slots {
        if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
            *slot = Some(value);
        }
    }

    if let Some(game_key) = lookup("YAHOO_GAME_KEY").filter(|v| !v.trim().is_empty()) {
        yahoo.game_key = game_key;
    }
}
