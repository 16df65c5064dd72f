//! Logging initialization

use tracing_subscriber::{fmt, EnvFilter};

use super::types::AppSettings;
use crate::common::errors::{FantasyError, Result};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level; `override_level` (from the
/// command line) wins over the config file.
pub fn init_logging(settings: &AppSettings, override_level: Option<&str>) -> Result<()> {
    let level = override_level.unwrap_or(&settings.log_level).to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = match settings.log_format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        _ => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
    };

    installed.map_err(|e| FantasyError::Internal(format!("Failed to install logger: {}", e)))
}
