use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, IntCounterVec, register_counter, register_gauge,
    register_histogram, register_int_counter_vec,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("tinylm_requests_total", "Total number of requests").unwrap();
    pub static ref RATE_LIMITED: IntCounterVec = register_int_counter_vec!(
        "tinylm_rate_limited_total",
        "Requests denied by the rate gate",
        &["scope"]
    )
    .unwrap();
    pub static ref UPSTREAM_FAILURES: IntCounterVec = register_int_counter_vec!(
        "tinylm_upstream_failures_total",
        "Completion calls that ended in an error",
        &["kind"]
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "tinylm_upstream_latency_seconds",
        "Completion API latency in seconds"
    )
    .unwrap();
    pub static ref ACTIVE_SESSIONS: Gauge =
        register_gauge!("tinylm_active_sessions", "Chat sessions with stored history").unwrap();
}

// Register every metric up front so /metrics lists them before first use
pub fn init() {
    lazy_static::initialize(&REQUEST_TOTAL);
    lazy_static::initialize(&RATE_LIMITED);
    lazy_static::initialize(&UPSTREAM_FAILURES);
    lazy_static::initialize(&REQUEST_LATENCY);
    lazy_static::initialize(&ACTIVE_SESSIONS);
}
