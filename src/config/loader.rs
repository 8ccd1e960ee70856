//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::TrackerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the database connection string.
pub const MONGO_URI_ENV: &str = "MONGO_URI";

/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid PORT value {0:?}")]
    InvalidPort(String),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: TOML file (if given), then environment overrides, then
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<TrackerConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => TrackerConfig::default(),
    };

    let config = apply_overrides(
        config,
        std::env::var(MONGO_URI_ENV).ok(),
        std::env::var(PORT_ENV).ok(),
    )?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply externally supplied connection string and port.
pub fn apply_overrides(
    mut config: TrackerConfig,
    mongo_uri: Option<String>,
    port: Option<String>,
) -> Result<TrackerConfig, ConfigError> {
    if let Some(uri) = mongo_uri.filter(|u| !u.is_empty()) {
        config.database.uri = uri;
    }

    if let Some(port) = port.filter(|p| !p.is_empty()) {
        let port: u16 = port.parse().map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }

    Ok(config)
}

/// Replace the port of `bind_address`, falling back to all interfaces when
/// the configured address does not parse.
fn with_port(bind_address: &str, port: u16) -> String {
    match bind_address.parse::<SocketAddr>() {
        Ok(mut addr) => {
            addr.set_port(port);
            addr.to_string()
        }
        Err(_) => format!("0.0.0.0:{port}"),
    }
}
