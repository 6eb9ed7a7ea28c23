use crate::errors::{RateLimitError, Result};
use redis::aio::ConnectionLike;
use redis::Script;
use tracing::info;

const TOKEN_BUCKET_SCRIPT: &str = include_str!("../../scripts/token_bucket.lua");

/// Load the Lua script into the Redis script cache and return its SHA
pub async fn load_script<C: ConnectionLike>(conn: &mut C) -> Result<String> {
    let sha = get_script()
        .prepare_invoke()
        .load_async(conn)
        .await
        .map_err(|e| {
            RateLimitError::ScriptExecutionError(format!("Failed to load Lua script: {}", e))
        })?;

    info!("Token bucket script loaded (SHA: {})", sha);
    Ok(sha)
}

/// Get the script object for execution
pub fn get_script() -> Script {
    Script::new(TOKEN_BUCKET_SCRIPT)
}
