use crate::errors::Result;
use crate::keys::BucketKeys;
use crate::limiter::{BucketState, Decision, RateLimitParams};
use async_trait::async_trait;

/// Shared store holding bucket state.
///
/// `evaluate` must run read-refill-deduct-write as one indivisible step: no
/// other evaluation for the same keys may observe or produce an intermediate
/// state. Implementations must not retry internally.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Atomically evaluate one request and persist the new bucket state.
    async fn evaluate(
        &self,
        keys: &BucketKeys,
        params: &RateLimitParams,
        now: i64,
    ) -> Result<Decision>;

    /// Read the persisted state without consuming anything.
    async fn get_bucket_state(&self, keys: &BucketKeys) -> Result<Option<BucketState>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<()>;
}
