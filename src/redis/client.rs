use crate::errors::{RateLimitError, Result};
use crate::keys::BucketKeys;
use crate::limiter::token_bucket::REQUEST_COST;
use crate::limiter::{BucketState, Decision, RateLimitParams};
use crate::metrics;
use crate::redis::script::{get_script, load_script};
use crate::store::BucketStore;
use async_trait::async_trait;
use deadpool_redis::{Connection, Pool};
use redis::{Script, Value};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Bucket store backed by Redis and the token bucket Lua script
pub struct RedisBucketStore {
    pool: Pool,
    script: Script,
    command_timeout: Duration,
}

impl RedisBucketStore {
    /// Create the store and preload the script into Redis.
    pub async fn new(pool: Pool, command_timeout: Duration) -> Result<Self> {
        let store = Self {
            pool,
            script: get_script(),
            command_timeout,
        };

        store
            .bounded("load_script", async {
                let mut conn = store.connection().await?;
                load_script(&mut *conn).await
            })
            .await?;

        Ok(store)
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool.get().await.map_err(|e| {
            error!("Failed to get Redis connection: {}", e);
            RateLimitError::RedisConnectionError(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Pool exhausted",
                e.to_string(),
            )))
        })
    }

    /// Run one store round trip under the command timeout, recording metrics.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RateLimitError::Timeout {
                operation,
                timeout: self.command_timeout,
            }),
        };
        metrics::record_store_duration(operation, start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics::record_store_error(operation, e.kind());
        }
        result
    }
}

/// Parse the script reply: `[allowed (0|1), floor(tokens left)]`.
fn parse_script_response(result: &[Value]) -> Result<Decision> {
    if result.len() != 2 {
        return Err(RateLimitError::UnexpectedResponse(format!(
            "Invalid script response length: {}",
            result.len()
        )));
    }

    let allowed = match &result[0] {
        Value::Int(1) => true,
        Value::Int(0) => false,
        other => {
            return Err(RateLimitError::UnexpectedResponse(format!(
                "Invalid allowed value: {:?}",
                other
            )))
        }
    };

    let tokens_remaining = match &result[1] {
        Value::Int(v) if *v >= 0 => *v,
        other => {
            return Err(RateLimitError::UnexpectedResponse(format!(
                "Invalid tokens value: {:?}",
                other
            )))
        }
    };

    Ok(Decision::new(allowed, tokens_remaining))
}

fn parse_number(key: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>().map_err(|e| {
        RateLimitError::UnexpectedResponse(format!("Failed to parse '{}' from {}: {}", raw, key, e))
    })
}

#[async_trait]
impl BucketStore for RedisBucketStore {
    async fn evaluate(
        &self,
        keys: &BucketKeys,
        params: &RateLimitParams,
        now: i64,
    ) -> Result<Decision> {
        debug!(
            "Executing token bucket script: key={}, rate={}, burst={}, now={}",
            keys.tokens,
            params.replenish_rate(),
            params.burst_capacity(),
            now
        );

        let result = self
            .bounded("evaluate", async {
                let mut conn = self.connection().await?;
                let reply: Vec<Value> = self
                    .script
                    .key(&keys.tokens)
                    .key(&keys.timestamp)
                    .arg(params.replenish_rate())
                    .arg(params.burst_capacity())
                    .arg(now)
                    .arg(REQUEST_COST)
                    .invoke_async(&mut *conn)
                    .await
                    .map_err(|e| {
                        RateLimitError::ScriptExecutionError(format!(
                            "Script execution failed: {}",
                            e
                        ))
                    })?;
                parse_script_response(&reply)
            })
            .await;

        metrics::record_script_execution(result.is_ok());

        let decision = result?;
        debug!(
            "Script result: allowed={}, tokens_remaining={}",
            decision.allowed(),
            decision.tokens_remaining()
        );
        Ok(decision)
    }

    async fn get_bucket_state(&self, keys: &BucketKeys) -> Result<Option<BucketState>> {
        let (tokens, timestamp): (Option<String>, Option<String>) = self
            .bounded("get_bucket_state", async {
                let mut conn = self.connection().await?;
                redis::cmd("MGET")
                    .arg(&keys.tokens)
                    .arg(&keys.timestamp)
                    .query_async(&mut *conn)
                    .await
                    .map_err(|e| RateLimitError::RedisCommandError(e.to_string()))
            })
            .await?;

        match (tokens, timestamp) {
            (Some(tokens), Some(timestamp)) => Ok(Some(BucketState {
                tokens: parse_number(&keys.tokens, &tokens)?,
                last_refill: parse_number(&keys.timestamp, &timestamp)? as i64,
            })),
            _ => {
                debug!("Bucket not found: {}", keys.tokens);
                Ok(None)
            }
        }
    }

    async fn health_check(&self) -> Result<()> {
        let response: String = self
            .bounded("ping", async {
                let mut conn = self.connection().await?;
                Ok(redis::cmd("PING").query_async(&mut *conn).await?)
            })
            .await?;

        if response != "PONG" {
            return Err(RateLimitError::UnexpectedResponse(format!(
                "Unexpected PING response: {}",
                response
            )));
        }

        Ok(())
    }
}
