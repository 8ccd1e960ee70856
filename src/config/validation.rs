//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TrackerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{StoreBackend, TrackerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("database.uri: expected a mongodb:// or mongodb+srv:// URI")]
    InvalidMongoUri,

    #[error("{0}: must not be empty")]
    Empty(&'static str),

    #[error("{0}: must be greater than zero")]
    Zero(&'static str),

    #[error("observability.log_level: invalid filter {0:?}")]
    InvalidLogLevel(String),
}

pub fn validate_config(config: &TrackerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let db = &config.database;
    if db.backend == StoreBackend::Mongodb
        && !(db.uri.starts_with("mongodb://") || db.uri.starts_with("mongodb+srv://"))
    {
        errors.push(ValidationError::InvalidMongoUri);
    }
    if db.database.trim().is_empty() {
        errors.push(ValidationError::Empty("database.database"));
    }
    if db.collection.trim().is_empty() {
        errors.push(ValidationError::Empty("database.collection"));
    }
    if db.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("database.connect_timeout_secs"));
    }
    if db.max_pool_size == Some(0) {
        errors.push(ValidationError::Zero("database.max_pool_size"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    let obs = &config.observability;
    if EnvFilter::try_new(&obs.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: obs.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
