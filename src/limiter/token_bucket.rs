use super::{BucketState, Decision, RateLimitParams};

/// Tokens consumed by one request.
pub const REQUEST_COST: f64 = 1.0;

/// Upper bound on the state expiry (one year). Mirrored in `scripts/token_bucket.lua`.
pub const MAX_STATE_TTL_SECS: u64 = 31_536_000;

/// New state to persist plus the decision to report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub decision: Decision,
    pub state: BucketState,
}

/// Evaluate one request against the stored bucket.
///
/// Same arithmetic as `scripts/token_bucket.lua`; keep the two in step.
///
/// Missing tokens default to a full bucket, a missing timestamp to `now`.
/// Clock skew that puts `now` before the stored timestamp refills nothing.
pub fn evaluate(
    stored_tokens: Option<f64>,
    stored_last_refill: Option<i64>,
    params: &RateLimitParams,
    now: i64,
) -> Outcome {
    let capacity = params.burst_capacity();
    let last_tokens = stored_tokens.unwrap_or(capacity);
    let last_refill = stored_last_refill.unwrap_or(now);

    let elapsed = (now - last_refill).max(0) as f64;
    let refilled = capacity.min(last_tokens + elapsed * params.replenish_rate());

    let (allowed, tokens) = if refilled >= REQUEST_COST {
        (true, refilled - REQUEST_COST)
    } else {
        (false, refilled)
    };

    Outcome {
        decision: Decision::new(allowed, tokens.floor() as i64),
        state: BucketState {
            tokens,
            last_refill: now,
        },
    }
}

/// Expiry attached to both keys: twice the fill time, clamped to
/// `[1, MAX_STATE_TTL_SECS]`.
pub fn state_ttl_secs(params: &RateLimitParams) -> u64 {
    let ttl = (params.fill_time_secs() * 2.0).floor();
    if ttl < 1.0 {
        1
    } else if ttl >= MAX_STATE_TTL_SECS as f64 {
        MAX_STATE_TTL_SECS
    } else {
        ttl as u64
    }
}
