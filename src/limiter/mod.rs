pub mod bucket_limiter;
pub mod token_bucket;

use crate::config::validator::validate_rate_params;
use crate::errors::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use bucket_limiter::TokenBucketLimiter;

/// Outcome of one admission check.
///
/// `tokens_remaining` is the bucket level floored to an integer. The stored
/// level keeps its fraction; see [`BucketState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    allowed: bool,
    tokens_remaining: i64,
}

impl Decision {
    /// Reported in place of a token count when the store could not be consulted.
    pub const UNKNOWN_TOKENS: i64 = -1;

    pub fn new(allowed: bool, tokens_remaining: i64) -> Self {
        Self {
            allowed,
            tokens_remaining,
        }
    }

    /// Decision returned when the store is unavailable: admit, count unknown.
    pub fn fail_open() -> Self {
        Self::new(true, Self::UNKNOWN_TOKENS)
    }

    pub fn allowed(&self) -> bool {
        self.allowed
    }

    pub fn tokens_remaining(&self) -> i64 {
        self.tokens_remaining
    }

    pub fn is_fail_open(&self) -> bool {
        self.allowed && self.tokens_remaining == Self::UNKNOWN_TOKENS
    }
}

/// Per-call bucket parameters. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitParams {
    replenish_rate: f64,
    burst_capacity: f64,
}

impl RateLimitParams {
    /// Both values must be finite and strictly positive.
    pub fn new(replenish_rate: f64, burst_capacity: f64) -> Result<Self> {
        validate_rate_params(replenish_rate, burst_capacity)?;
        Ok(Self {
            replenish_rate,
            burst_capacity,
        })
    }

    /// Tokens added per second.
    pub fn replenish_rate(&self) -> f64 {
        self.replenish_rate
    }

    /// Maximum tokens the bucket can hold.
    pub fn burst_capacity(&self) -> f64 {
        self.burst_capacity
    }

    /// Seconds to refill from empty to full.
    pub fn fill_time_secs(&self) -> f64 {
        self.burst_capacity / self.replenish_rate
    }
}

/// Persisted state of one bucket.
///
/// `tokens` is the fractional accumulator; truncating it on write would leak
/// capacity under sustained near-threshold traffic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketState {
    pub tokens: f64,
    /// Epoch seconds of the last evaluation.
    pub last_refill: i64,
}

/// Trait for admission checks against a named quota
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Consume one token from the bucket for `id` if one is available.
    async fn is_allowed(
        &self,
        id: &str,
        replenish_rate: f64,
        burst_capacity: f64,
    ) -> Result<Decision>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RateLimitError;

    #[test]
    fn test_fail_open_decision() {
        let decision = Decision::fail_open();
        assert!(decision.allowed());
        assert_eq!(decision.tokens_remaining(), -1);
        assert!(decision.is_fail_open());
        assert!(!Decision::new(true, 0).is_fail_open());
    }

    #[test]
    fn test_params_reject_non_positive() {
        assert!(matches!(
            RateLimitParams::new(0.0, 10.0),
            Err(RateLimitError::InvalidRate(_))
        ));
        assert!(matches!(
            RateLimitParams::new(1.0, -1.0),
            Err(RateLimitError::InvalidRate(_))
        ));
        assert!(matches!(
            RateLimitParams::new(f64::NAN, 10.0),
            Err(RateLimitError::InvalidRate(_))
        ));
        assert!(matches!(
            RateLimitParams::new(1.0, f64::INFINITY),
            Err(RateLimitError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_fill_time() {
        let params = RateLimitParams::new(2.0, 10.0).unwrap();
        assert_eq!(params.fill_time_secs(), 5.0);
    }

    #[test]
    fn test_decision_serializes() {
        let json = serde_json::to_value(Decision::new(false, 0)).unwrap();
        assert_eq!(json["allowed"], false);
        assert_eq!(json["tokens_remaining"], 0);
    }
}
