//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{
    Counter, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bucketgate_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "bucketgate_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Object Store Metrics
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bucketgate_store_operations_total", "Total number of object store operations"),
        &["operation", "outcome"]
    ).expect("metric can be created");
    pub static ref STORE_OPERATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "bucketgate_store_operation_duration_seconds",
            "Object store operation duration in seconds"
        ).buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"]
    ).expect("metric can be created");

    // Transfer Metrics
    pub static ref UPLOADS_TOTAL: IntCounter = IntCounter::new(
        "bucketgate_uploads_total",
        "Total number of successful uploads"
    ).expect("metric can be created");
    pub static ref BYTES_UPLOADED: Counter = Counter::new(
        "bucketgate_bytes_uploaded_total",
        "Total bytes written to the object store"
    ).expect("metric can be created");
    pub static ref BYTES_SERVED: Counter = Counter::new(
        "bucketgate_bytes_served_total",
        "Total bytes returned from the object store"
    ).expect("metric can be created");

    // Password Limiter Metrics
    pub static ref PASSWORD_CHECKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bucketgate_password_checks_total", "Upload password checks by verdict"),
        &["verdict"]
    ).expect("metric can be created");
    pub static ref LIMITER_TRACKED_CLIENTS: IntGauge = IntGauge::new(
        "bucketgate_limiter_tracked_clients",
        "Number of clients tracked by the password retry limiter"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bucketgate_errors_total", "Total number of errors by type"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; registration happens on the first call.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
            .expect("HTTP_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
            .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(STORE_OPERATIONS_TOTAL.clone()))
            .expect("STORE_OPERATIONS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STORE_OPERATION_DURATION_SECONDS.clone()))
            .expect("STORE_OPERATION_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(UPLOADS_TOTAL.clone()))
            .expect("UPLOADS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(BYTES_UPLOADED.clone()))
            .expect("BYTES_UPLOADED can be registered");
        REGISTRY
            .register(Box::new(BYTES_SERVED.clone()))
            .expect("BYTES_SERVED can be registered");
        REGISTRY
            .register(Box::new(PASSWORD_CHECKS_TOTAL.clone()))
            .expect("PASSWORD_CHECKS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(LIMITER_TRACKED_CLIENTS.clone()))
            .expect("LIMITER_TRACKED_CLIENTS can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
