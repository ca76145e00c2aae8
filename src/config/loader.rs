//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::config::resolve::resolve_global_config;
use crate::config::schema::RegistrationConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, resolve and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RegistrationConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<RegistrationConfig, ConfigError> {
    Ok(resolve_global_config(&parse_raw_config(content)?))
}

/// Read a TOML file into the raw value `resolve_global_config` accepts.
///
/// Callers overriding fields (the CLI) merge into this value before resolving,
/// so everything derived from the root follows the override.
pub fn load_raw_config(path: &Path) -> Result<Value, ConfigError> {
    parse_raw_config(&fs::read_to_string(path)?)
}

/// Parse TOML text into a raw JSON value.
pub fn parse_raw_config(content: &str) -> Result<Value, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    // TOML values always map onto JSON values; fall back to defaults if not.
    Ok(serde_json::to_value(table).unwrap_or_default())
}
