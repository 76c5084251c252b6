//! Prometheus metrics for the question server

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

lazy_static! {
    // HTTP Request Metrics

    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "qbank_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "qbank_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "qbank_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    // Search Metrics

    /// Searches by paging strategy (single_phase, two_phase)
    pub static ref QUESTION_SEARCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "qbank_question_search_total",
        "Total number of question searches",
        &["strategy"]
    )
    .expect("Failed to register QUESTION_SEARCH_TOTAL");

    pub static ref QUESTION_SEARCH_RESULTS: HistogramVec = register_histogram_vec!(
        "qbank_question_search_results",
        "Number of questions returned per page",
        &["strategy"],
        vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0]
    )
    .expect("Failed to register QUESTION_SEARCH_RESULTS");

    /// Count cache outcomes (hit, miss, cache_error, count_error)
    pub static ref COUNT_CACHE_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "qbank_count_cache_events_total",
        "Total count cache lookups by outcome",
        &["outcome"]
    )
    .expect("Failed to register COUNT_CACHE_EVENTS_TOTAL");

    // Database Metrics

    pub static ref DB_QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "qbank_db_query_duration_seconds",
        "Database query duration in seconds",
        &["query_type"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]
    )
    .expect("Failed to register DB_QUERY_DURATION_SECONDS");

    pub static ref DB_QUERY_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "qbank_db_query_errors_total",
        "Total number of database query errors",
        &["query_type"]
    )
    .expect("Failed to register DB_QUERY_ERRORS_TOTAL");

    // Recommendation Metrics

    /// Recommendation calls by outcome (success, failure, disabled)
    pub static ref RECOMMEND_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "qbank_recommend_requests_total",
        "Total number of recommendation service calls",
        &["outcome"]
    )
    .expect("Failed to register RECOMMEND_REQUESTS_TOTAL");
}

/// Replace numeric path segments so ids do not explode label cardinality.
pub fn sanitize_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    let sanitized: Vec<&str> = path
        .split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect();

    sanitized.join("/")
}
