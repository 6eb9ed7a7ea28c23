//! Distributed token-bucket admission control.
//!
//! Bucket state lives in a shared store and every check is a single atomic
//! read-refill-deduct-write against it, so any number of processes can share
//! one quota. When the store cannot be reached the limiter fails open.
//!
//! ```no_run
//! use bucketgate::{LimiterConfig, RateLimiter, RedisConfig, TokenBucketLimiter};
//!
//! # async fn run() -> bucketgate::Result<()> {
//! let limiter = TokenBucketLimiter::connect(&RedisConfig::from_env(), LimiterConfig::default()).await?;
//! let decision = limiter.is_allowed("tenant-42", 10.0, 20.0).await?;
//! if !decision.allowed() {
//!     // reject the request
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod errors;
pub mod keys;
pub mod limiter;
pub mod memory;
pub mod metrics;
pub mod redis;
pub mod store;

// Re-export commonly used types
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{LimiterConfig, RedisConfig};
pub use crate::errors::{RateLimitError, Result};
pub use crate::keys::BucketKeys;
pub use crate::limiter::{BucketState, Decision, RateLimitParams, RateLimiter, TokenBucketLimiter};
pub use crate::memory::InMemoryBucketStore;
pub use crate::redis::RedisBucketStore;
pub use crate::store::BucketStore;
