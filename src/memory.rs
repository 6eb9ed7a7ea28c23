use crate::clock::{Clock, SystemClock};
use crate::errors::{RateLimitError, Result};
use crate::keys::{hash_tag, BucketKeys};
use crate::limiter::token_bucket::{self, state_ttl_secs};
use crate::limiter::{BucketState, Decision, RateLimitParams};
use crate::store::BucketStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Evaluations between two sweeps of expired keys.
pub const DEFAULT_CLEANUP_INTERVAL: usize = 1_000;

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: f64,
    expires_at: i64,
}

impl Entry {
    fn live(&self, now: i64) -> bool {
        self.expires_at > now
    }
}

type Partition = HashMap<String, Entry>;

/// In-memory [`BucketStore`] with per-slot locking and key expiry.
///
/// Keys are grouped into partitions by hash tag, like cluster slots. An
/// evaluation holds its partition's lock for the whole read-modify-write.
/// Expired keys are swept every `cleanup_interval` evaluations.
#[derive(Debug, Clone)]
pub struct InMemoryBucketStore {
    partitions: Arc<DashMap<String, Partition>>,
    clock: Arc<dyn Clock>,
    operations_since_cleanup: Arc<AtomicUsize>,
    cleanup_interval: usize,
}

impl Default for InMemoryBucketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBucketStore {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Use `clock` to decide expiry outside of evaluations.
    pub fn with_clock<C: Clock + 'static>(clock: C) -> Self {
        Self {
            partitions: Arc::new(DashMap::new()),
            clock: Arc::new(clock),
            operations_since_cleanup: Arc::new(AtomicUsize::new(0)),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }

    /// Sweep expired keys every `interval` evaluations (at least 1).
    pub fn with_cleanup_interval(mut self, interval: usize) -> Self {
        self.cleanup_interval = interval.max(1);
        self
    }

    /// Number of hash-tag partitions currently held, live or not.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = self.clock.now_epoch_seconds();
        self.partitions
            .iter()
            .map(|p| p.values().filter(|e| e.live(now)).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired keys and empty partitions. Returns the number of keys removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(self.clock.now_epoch_seconds())
    }

    fn purge_expired_at(&self, now: i64) -> usize {
        self.operations_since_cleanup.store(0, Ordering::Relaxed);
        let mut removed = 0;
        self.partitions.retain(|_, partition| {
            let before = partition.len();
            partition.retain(|_, e| e.live(now));
            removed += before - partition.len();
            !partition.is_empty()
        });
        if removed > 0 {
            debug!("Purged {} expired bucket keys", removed);
        }
        removed
    }

    fn maybe_cleanup(&self, now: i64) {
        let ops = self.operations_since_cleanup.fetch_add(1, Ordering::Relaxed) + 1;
        if ops >= self.cleanup_interval {
            self.purge_expired_at(now);
        }
    }

    fn slot_for(keys: &BucketKeys) -> Result<String> {
        let slot = hash_tag(&keys.tokens);
        if slot != hash_tag(&keys.timestamp) {
            return Err(RateLimitError::RedisCommandError(format!(
                "CROSSSLOT keys '{}' and '{}' don't hash to the same slot",
                keys.tokens, keys.timestamp
            )));
        }
        Ok(slot.to_string())
    }
}

fn read(partition: &Partition, key: &str, now: i64) -> Option<f64> {
    partition
        .get(key)
        .filter(|e| e.live(now))
        .map(|e| e.value)
}

#[async_trait]
impl BucketStore for InMemoryBucketStore {
    async fn evaluate(
        &self,
        keys: &BucketKeys,
        params: &RateLimitParams,
        now: i64,
    ) -> Result<Decision> {
        let slot = Self::slot_for(keys)?;
        let decision = {
            let mut partition = self.partitions.entry(slot).or_default();

            let outcome = token_bucket::evaluate(
                read(&partition, &keys.tokens, now),
                read(&partition, &keys.timestamp, now).map(|ts| ts as i64),
                params,
                now,
            );

            let ttl = i64::try_from(state_ttl_secs(params)).unwrap_or(i64::MAX);
            let expires_at = now.saturating_add(ttl);
            partition.insert(
                keys.tokens.clone(),
                Entry {
                    value: outcome.state.tokens,
                    expires_at,
                },
            );
            partition.insert(
                keys.timestamp.clone(),
                Entry {
                    value: outcome.state.last_refill as f64,
                    expires_at,
                },
            );
            outcome.decision
        };

        // The partition lock is released before sweeping.
        self.maybe_cleanup(now);
        Ok(decision)
    }

    async fn get_bucket_state(&self, keys: &BucketKeys) -> Result<Option<BucketState>> {
        let slot = Self::slot_for(keys)?;
        let now = self.clock.now_epoch_seconds();
        let Some(partition) = self.partitions.get(&slot) else {
            return Ok(None);
        };

        let tokens = read(&partition, &keys.tokens, now);
        let last_refill = read(&partition, &keys.timestamp, now);
        Ok(match (tokens, last_refill) {
            (Some(tokens), Some(last_refill)) => Some(BucketState {
                tokens,
                last_refill: last_refill as i64,
            }),
            _ => None,
        })
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
