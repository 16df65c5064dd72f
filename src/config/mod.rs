//! Configuration loading and logging setup

pub mod loader;
pub mod logging;
pub mod types;

pub use loader::load_config;
pub use types::AppConfig;
