use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    // Decision metrics
    pub static ref DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "bucketgate_decisions_total",
        "Total number of admission decisions",
        &["allowed"]
    ).unwrap();

    pub static ref FAIL_OPEN_TOTAL: IntCounterVec = register_int_counter_vec!(
        "bucketgate_fail_open_total",
        "Requests admitted because the store could not be consulted",
        &["error_type"]
    ).unwrap();

    // Store metrics
    pub static ref STORE_DURATION: HistogramVec = register_histogram_vec!(
        "bucketgate_store_duration_seconds",
        "Store round-trip duration in seconds",
        &["operation"],
        vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5]
    ).unwrap();

    pub static ref STORE_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "bucketgate_store_errors_total",
        "Total number of store errors",
        &["operation", "error_type"]
    ).unwrap();

    pub static ref SCRIPT_EXECUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "bucketgate_script_executions_total",
        "Total number of Lua script executions",
        &["result"]
    ).unwrap();
}

/// Record an admission decision that came from the store
pub fn record_decision(allowed: bool) {
    let allowed_str = if allowed { "true" } else { "false" };
    DECISIONS_TOTAL.with_label_values(&[allowed_str]).inc();
}

/// Record a fail-open admission
pub fn record_fail_open(error_type: &str) {
    FAIL_OPEN_TOTAL.with_label_values(&[error_type]).inc();
}

/// Record store operation duration
pub fn record_store_duration(operation: &str, duration_secs: f64) {
    STORE_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Record store error
pub fn record_store_error(operation: &str, error_type: &str) {
    STORE_ERRORS_TOTAL
        .with_label_values(&[operation, error_type])
        .inc();
}

/// Record script execution
pub fn record_script_execution(success: bool) {
    let result = if success { "success" } else { "error" };
    SCRIPT_EXECUTIONS_TOTAL.with_label_values(&[result]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_open_counter_increments() {
        let before = FAIL_OPEN_TOTAL.with_label_values(&["metrics_test"]).get();
        record_fail_open("metrics_test");
        assert_eq!(
            FAIL_OPEN_TOTAL.with_label_values(&["metrics_test"]).get(),
            before + 1
        );
    }
}
