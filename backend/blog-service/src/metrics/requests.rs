use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    /// HTTP requests by method, matched route pattern and status code.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_http_requests_total",
        "Total HTTP requests segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register blog_http_requests_total");

    /// HTTP request latency by method and matched route pattern.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_http_request_duration_seconds",
        "HTTP request duration segmented by method and route",
        &["method", "route"]
    )
    .expect("failed to register blog_http_request_duration_seconds");

    /// Permission decisions by resource kind, action and outcome (allow/deny).
    pub static ref AUTHZ_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_authz_decisions_total",
        "Authorization decisions segmented by resource kind, action and outcome",
        &["kind", "action", "decision"]
    )
    .expect("failed to register blog_authz_decisions_total");
}
