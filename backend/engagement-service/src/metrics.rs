//! Prometheus metrics for engagement-service.
//!
//! Tracks toggle outcomes, contention retries and cascade work, and exposes
//! the `/metrics` handler.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Duration;

/// Toggles by edge kind and resulting state
static TOGGLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "engagement_toggles_total",
        "Total edge toggles by edge kind and resulting state",
        &["edge", "state"]
    )
    .expect("failed to register engagement_toggles_total")
});

/// Toggles that lost a race and needed the second remove
static TOGGLE_RETRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "engagement_toggle_retries_total",
        "Toggles that retried after a concurrent insert (outcome: resolved/conflict)",
        &["edge", "outcome"]
    )
    .expect("failed to register engagement_toggle_retries_total")
});

static CASCADE_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "engagement_cascade_runs_total",
        "Cascade runs by trigger and status (success/incomplete)",
        &["trigger", "status"]
    )
    .expect("failed to register engagement_cascade_runs_total")
});

static CASCADE_REMOVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "engagement_cascade_removed_total",
        "Rows removed by cascades and sweeps",
        &["item"]
    )
    .expect("failed to register engagement_cascade_removed_total")
});

static CASCADE_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "engagement_cascade_duration_seconds",
        "Duration of cascade runs",
        &["trigger"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("failed to register engagement_cascade_duration_seconds")
});

pub fn record_toggle(edge: &str, state: &str) {
    TOGGLES_TOTAL.with_label_values(&[edge, state]).inc();
}

pub fn record_toggle_retry(edge: &str, outcome: &str) {
    TOGGLE_RETRIES_TOTAL.with_label_values(&[edge, outcome]).inc();
}

pub fn record_cascade_run(trigger: &str, status: &str, duration: Duration) {
    CASCADE_RUNS_TOTAL.with_label_values(&[trigger, status]).inc();
    CASCADE_DURATION_SECONDS
        .with_label_values(&[trigger])
        .observe(duration.as_secs_f64());
}

pub fn record_cascade_removed(item: &str, count: u64) {
    if count > 0 {
        CASCADE_REMOVED_TOTAL.with_label_values(&[item]).inc_by(count);
    }
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
