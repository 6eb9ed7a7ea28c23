// Every evaluation is one EVALSHA of scripts/token_bucket.lua, so the
// read-refill-deduct-write sequence runs atomically on the server.

pub mod client;
pub mod pool;
pub mod script;

pub use client::RedisBucketStore;
pub use pool::create_redis_pool;
