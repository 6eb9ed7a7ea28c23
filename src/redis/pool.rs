use crate::config::{mask_password, RedisConfig};
use crate::errors::{RateLimitError, Result};
use deadpool::managed::{PoolConfig as DeadpoolPoolConfig, Timeouts};
use deadpool_redis::{Config as DeadpoolRedisConfig, Pool, Runtime};
use redis::RedisError;
use tracing::{debug, info};

/// Create a Redis connection pool from configuration
pub async fn create_redis_pool(config: &RedisConfig) -> Result<Pool> {
    info!(
        "Creating Redis connection pool for {}...",
        mask_password(&config.url)
    );

    let mut cfg = DeadpoolRedisConfig::from_url(config.url.clone());

    let mut pool_cfg = DeadpoolPoolConfig::new(config.max_connections);
    pool_cfg.timeouts = Timeouts {
        wait: Some(config.connection_timeout()),
        create: Some(config.connection_timeout()),
        recycle: Some(config.connection_timeout()),
    };
    cfg.pool = Some(pool_cfg);

    let pool = cfg.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
        RateLimitError::RedisConnectionError(RedisError::from((
            redis::ErrorKind::IoError,
            "Pool creation failed",
            e.to_string(),
        )))
    })?;

    info!(
        "Redis connection pool created (max_connections: {})",
        config.max_connections
    );

    debug!("Testing Redis connection...");
    let mut conn = pool.get().await.map_err(|e| {
        RateLimitError::RedisConnectionError(RedisError::from((
            redis::ErrorKind::IoError,
            "Failed to get connection",
            e.to_string(),
        )))
    })?;

    let _pong: String = redis::cmd("PING").query_async(&mut *conn).await?;

    info!("Redis connection test successful");

    Ok(pool)
}
