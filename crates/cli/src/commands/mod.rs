//! CLI command implementations.

pub mod config_cmd;
pub mod doctor;
pub mod run;

use helperbot_config::{AppConfig, ConfigError};
use std::path::Path;

/// Load the config from `path` or the default location, with environment
/// overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
}
