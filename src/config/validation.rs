//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All errors are
//! collected rather than stopping at the first one.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RelayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Path reserved for the liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("relay.path: '{0}' must start with '/'")]
    RelativePath(String),

    #[error("relay.path: '{0}' is reserved")]
    ReservedPath(String),

    #[error("relay.user_agent: must not be empty")]
    EmptyUserAgent,

    #[error("relay.max_body_bytes: must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.log_level: unknown level '{0}'")]
    UnknownLogLevel(String),
}

/// Check a parsed configuration, returning every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let path = &config.relay.path;
    if !path.starts_with('/') {
        errors.push(ValidationError::RelativePath(path.clone()));
    } else if path == HEALTH_PATH {
        errors.push(ValidationError::ReservedPath(path.clone()));
    }

    if config.relay.user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    }

    if config.relay.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
