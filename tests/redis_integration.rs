//! Tests against a live Redis. Run with
//! `REDIS_URL=redis://localhost:6379 cargo test -- --ignored`.

use bucketgate::{
    BucketKeys, BucketStore, Decision, LimiterConfig, RateLimitParams, RateLimiter, RedisConfig,
    TokenBucketLimiter,
};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_id(label: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", label, nanos)
}

fn redis_config() -> RedisConfig {
    RedisConfig {
        url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        ..RedisConfig::default()
    }
}

async fn connect() -> TokenBucketLimiter<bucketgate::RedisBucketStore> {
    let config = LimiterConfig {
        namespace: "bucketgate_test".to_string(),
    };
    TokenBucketLimiter::connect(&redis_config(), config)
        .await
        .expect("Redis must be reachable for ignored tests")
}

#[tokio::test]
#[ignore]
async fn script_matches_token_bucket_semantics() {
    let limiter = connect().await;
    let store = limiter.store();
    let keys = BucketKeys::derive(limiter.namespace(), &unique_id("script")).unwrap();
    let params = RateLimitParams::new(1.0, 10.0).unwrap();

    let now = 1_000;
    assert_eq!(
        store.evaluate(&keys, &params, now).await.unwrap(),
        Decision::new(true, 9)
    );
    for expected in (0..=8).rev() {
        assert_eq!(
            store.evaluate(&keys, &params, now).await.unwrap(),
            Decision::new(true, expected)
        );
    }
    assert_eq!(
        store.evaluate(&keys, &params, now).await.unwrap(),
        Decision::new(false, 0)
    );
    assert_eq!(
        store.evaluate(&keys, &params, now + 5).await.unwrap(),
        Decision::new(true, 4)
    );

    let state = store.get_bucket_state(&keys).await.unwrap().unwrap();
    assert_eq!(state.tokens, 4.0);
    assert_eq!(state.last_refill, now + 5);
}

#[tokio::test]
#[ignore]
async fn script_keeps_fractional_tokens() {
    let limiter = connect().await;
    let store = limiter.store();
    let keys = BucketKeys::derive(limiter.namespace(), &unique_id("fraction")).unwrap();
    let params = RateLimitParams::new(0.5, 2.5).unwrap();

    store.evaluate(&keys, &params, 0).await.unwrap();
    let state = store.get_bucket_state(&keys).await.unwrap().unwrap();
    assert_eq!(state.tokens, 1.5);
}

#[tokio::test]
#[ignore]
async fn limiter_admits_through_redis() {
    let limiter = connect().await;
    limiter.health_check().await.unwrap();

    let id = unique_id("facade");
    let decision = limiter.is_allowed(&id, 5.0, 3.0).await.unwrap();
    assert_eq!(decision, Decision::new(true, 2));
}

#[tokio::test]
async fn unreachable_redis_fails_construction() {
    let config = RedisConfig {
        url: "redis://127.0.0.1:1".to_string(),
        connection_timeout_secs: 1,
        ..RedisConfig::default()
    };
    assert!(TokenBucketLimiter::connect(&config, LimiterConfig::default())
        .await
        .is_err());
}
