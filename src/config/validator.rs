use crate::config::{LimiterConfig, RedisConfig};
use crate::errors::{RateLimitError, Result};
use tracing::{debug, warn};

/// Validate Redis configuration
pub fn validate_redis_config(config: &RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(RateLimitError::ConfigurationError(
            "Redis URL cannot be empty".to_string(),
        ));
    }

    if !config.url.starts_with("redis://") && !config.url.starts_with("rediss://") {
        return Err(RateLimitError::ConfigurationError(format!(
            "Invalid Redis URL format: {}. Must start with redis:// or rediss://",
            crate::config::mask_password(&config.url)
        )));
    }

    if config.max_connections == 0 {
        return Err(RateLimitError::ConfigurationError(
            "max_connections must be greater than 0".to_string(),
        ));
    }

    if config.max_connections > 1000 {
        warn!(
            "max_connections is very high ({}). This may consume excessive resources.",
            config.max_connections
        );
    }

    if config.connection_timeout_secs == 0 {
        return Err(RateLimitError::ConfigurationError(
            "connection_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.command_timeout_ms == 0 {
        return Err(RateLimitError::ConfigurationError(
            "command_timeout_ms must be greater than 0".to_string(),
        ));
    }

    debug!("Redis configuration valid");
    Ok(())
}

/// Validate limiter configuration
pub fn validate_limiter_config(config: &LimiterConfig) -> Result<()> {
    if config.namespace.is_empty() {
        return Err(RateLimitError::ConfigurationError(
            "Namespace cannot be empty".to_string(),
        ));
    }

    // A brace in the namespace would become the hash tag instead of the identifier.
    if config.namespace.contains(['{', '}']) {
        return Err(RateLimitError::ConfigurationError(format!(
            "Namespace '{}' must not contain '{{' or '}}'",
            config.namespace
        )));
    }

    if config.namespace.chars().any(char::is_whitespace) {
        return Err(RateLimitError::ConfigurationError(format!(
            "Namespace '{}' must not contain whitespace",
            config.namespace
        )));
    }

    Ok(())
}

/// Validate per-call bucket parameters
pub fn validate_rate_params(replenish_rate: f64, burst_capacity: f64) -> Result<()> {
    if !replenish_rate.is_finite() || replenish_rate <= 0.0 {
        return Err(RateLimitError::InvalidRate(format!(
            "replenish_rate must be a positive number (got {})",
            replenish_rate
        )));
    }

    if !burst_capacity.is_finite() || burst_capacity <= 0.0 {
        return Err(RateLimitError::InvalidRate(format!(
            "burst_capacity must be a positive number (got {})",
            burst_capacity
        )));
    }

    Ok(())
}
