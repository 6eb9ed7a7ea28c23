use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid rate configuration: {0}")]
    InvalidRate(String),

    #[error("Redis connection error: {0}")]
    RedisConnectionError(#[from] redis::RedisError),

    #[error("Redis command error: {0}")]
    RedisCommandError(String),

    #[error("Script execution error: {0}")]
    ScriptExecutionError(String),

    #[error("Unexpected store response: {0}")]
    UnexpectedResponse(String),

    #[error("Store operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RateLimitError {
    /// Errors caused by the caller's arguments rather than the store.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RateLimitError::InvalidIdentifier(_) | RateLimitError::InvalidRate(_)
        )
    }

    /// Errors raised while reaching or talking to the shared store.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            RateLimitError::RedisConnectionError(_)
                | RateLimitError::RedisCommandError(_)
                | RateLimitError::ScriptExecutionError(_)
                | RateLimitError::UnexpectedResponse(_)
                | RateLimitError::Timeout { .. }
                | RateLimitError::InternalError(_)
        )
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RateLimitError::ConfigurationError(_) => "configuration",
            RateLimitError::InvalidIdentifier(_) => "invalid_identifier",
            RateLimitError::InvalidRate(_) => "invalid_rate",
            RateLimitError::RedisConnectionError(_) => "connection",
            RateLimitError::RedisCommandError(_) => "command",
            RateLimitError::ScriptExecutionError(_) => "script",
            RateLimitError::UnexpectedResponse(_) => "unexpected_response",
            RateLimitError::Timeout { .. } => "timeout",
            RateLimitError::InternalError(_) => "internal",
        }
    }
}

/// Result type alias for rate limiter operations
pub type Result<T> = std::result::Result<T, RateLimitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let input = RateLimitError::InvalidIdentifier("empty".to_string());
        assert!(input.is_input_error());
        assert!(!input.is_infrastructure());

        let timeout = RateLimitError::Timeout {
            operation: "evaluate",
            timeout: Duration::from_millis(50),
        };
        assert!(timeout.is_infrastructure());
        assert_eq!(timeout.kind(), "timeout");

        let config = RateLimitError::ConfigurationError("bad".to_string());
        assert!(!config.is_input_error());
        assert!(!config.is_infrastructure());
    }

    #[test]
    fn test_redis_error_converts() {
        let err: RateLimitError =
            redis::RedisError::from((redis::ErrorKind::IoError, "Connection refused")).into();
        assert!(matches!(err, RateLimitError::RedisConnectionError(_)));
        assert_eq!(err.kind(), "connection");
    }
}
