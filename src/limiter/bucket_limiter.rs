use crate::clock::{Clock, SystemClock};
use crate::config::validator::{validate_limiter_config, validate_redis_config};
use crate::config::{LimiterConfig, RedisConfig};
use crate::errors::Result;
use crate::keys::BucketKeys;
use crate::limiter::{BucketState, Decision, RateLimitParams, RateLimiter};
use crate::metrics;
use crate::redis::{create_redis_pool, RedisBucketStore};
use crate::store::BucketStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Token bucket rate limiter over a shared [`BucketStore`].
///
/// A value of this type is always bound to a store: construction is the
/// only setup step. Clones share the store.
pub struct TokenBucketLimiter<S: BucketStore, C: Clock = SystemClock> {
    store: Arc<S>,
    clock: C,
    namespace: String,
}

impl<S: BucketStore, C: Clock + Clone> Clone for TokenBucketLimiter<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

impl TokenBucketLimiter<RedisBucketStore> {
    /// Connect to Redis, load the script, and return a ready limiter.
    pub async fn connect(redis: &RedisConfig, config: LimiterConfig) -> Result<Self> {
        validate_redis_config(redis)?;
        validate_limiter_config(&config)?;

        let pool = create_redis_pool(redis).await?;
        let store = RedisBucketStore::new(pool, redis.command_timeout()).await?;

        info!(
            "Token bucket limiter ready (namespace: {})",
            config.namespace
        );
        Self::new(Arc::new(store), config)
    }
}

impl<S: BucketStore> TokenBucketLimiter<S, SystemClock> {
    pub fn new(store: Arc<S>, config: LimiterConfig) -> Result<Self> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: BucketStore, C: Clock> TokenBucketLimiter<S, C> {
    pub fn with_clock(store: Arc<S>, config: LimiterConfig, clock: C) -> Result<Self> {
        validate_limiter_config(&config)?;
        Ok(Self {
            store,
            clock,
            namespace: config.namespace,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Read the persisted bucket for `id` without consuming a token.
    ///
    /// Unlike [`RateLimiter::is_allowed`], store errors are returned as-is.
    pub async fn bucket_state(&self, id: &str) -> Result<Option<BucketState>> {
        let keys = BucketKeys::derive(&self.namespace, id)?;
        self.store.get_bucket_state(&keys).await
    }

    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}

#[async_trait]
impl<S, C> RateLimiter for TokenBucketLimiter<S, C>
where
    S: BucketStore + 'static,
    C: Clock + 'static,
{
    /// Input errors are returned; store failures fail open.
    async fn is_allowed(
        &self,
        id: &str,
        replenish_rate: f64,
        burst_capacity: f64,
    ) -> Result<Decision> {
        let keys = BucketKeys::derive(&self.namespace, id)?;
        let params = RateLimitParams::new(replenish_rate, burst_capacity)?;
        let now = self.clock.now_epoch_seconds();

        debug!(
            "Checking rate limit: id={}, rate={}, burst={}, now={}",
            id, replenish_rate, burst_capacity, now
        );

        match self.store.evaluate(&keys, &params, now).await {
            Ok(decision) => {
                metrics::record_decision(decision.allowed());
                debug!(
                    "Rate limit decision: id={}, allowed={}, tokens_remaining={}",
                    id,
                    decision.allowed(),
                    decision.tokens_remaining()
                );
                Ok(decision)
            }
            Err(e) => {
                metrics::record_fail_open(e.kind());
                warn!(
                    "Failing open for rate limit id '{}' due to store error: {}",
                    id, e
                );
                Ok(Decision::fail_open())
            }
        }
    }
}
