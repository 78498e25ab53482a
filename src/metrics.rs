//! Prometheus Metrics for Pipeline Stages
//!
//! Metrics include:
//! - ingest outcomes (inserted / duplicate / failed)
//! - enrichment outcomes and provider calls per phase
//! - notification outcomes
//! - latency per stage (histogram)
//! - error counts
//! - HTTP responses per route

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramOpts, HistogramVec,
    IntCounterVec, TextEncoder,
};
use tracing::error;

// ============================================
// METRIC DEFINITIONS
// ============================================

/// Stages of the content pipeline
pub const STAGE_INGEST: &str = "ingest";
pub const STAGE_ENRICH: &str = "enrich";
pub const STAGE_NOTIFY: &str = "notify";

/// Provider call phases
pub const PHASE_TRANSLATE: &str = "translate";
pub const PHASE_SEO: &str = "seo";

static INGEST_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_ingest_items_total",
        "Feed entries handled by the ingestor, by outcome",
        &["outcome"]
    )
    .expect("Failed to create ingest_items metric")
});

static ENRICH_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_enrich_total",
        "Enrichment invocations by outcome",
        &["outcome"]
    )
    .expect("Failed to create enrich_outcomes metric")
});

static PROVIDER_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_provider_calls_total",
        "Text-generation calls by phase and result",
        &["phase", "result"]
    )
    .expect("Failed to create provider_calls metric")
});

static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_notifications_total",
        "Notifier invocations by outcome",
        &["outcome"]
    )
    .expect("Failed to create notifications metric")
});

static ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_errors_total",
        "Total number of errors by stage and type",
        &["stage", "error_type"]
    )
    .expect("Failed to create errors metric")
});

// Latency histogram (in seconds); provider calls dominate
static STAGE_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];
    register_histogram_vec!(
        HistogramOpts::new(
            "relay_stage_latency_seconds",
            "Latency of each pipeline stage in seconds"
        )
        .buckets(buckets),
        &["stage"]
    )
    .expect("Failed to create stage_latency metric")
});

static HTTP_RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_http_responses_total",
        "HTTP responses by route and status code",
        &["route", "status"]
    )
    .expect("Failed to create http_responses metric")
});

// ============================================
// METRICS API
// ============================================

pub fn record_ingest(outcome: &str, count: u64) {
    INGEST_ITEMS.with_label_values(&[outcome]).inc_by(count);
}

pub fn record_enrich(outcome: &str) {
    ENRICH_OUTCOMES.with_label_values(&[outcome]).inc();
}

pub fn record_provider_call(phase: &str, result: &str) {
    PROVIDER_CALLS.with_label_values(&[phase, result]).inc();
}

pub fn record_notification(outcome: &str) {
    NOTIFICATIONS.with_label_values(&[outcome]).inc();
}

/// Records an error
pub fn record_error(stage: &str, error_type: &str) {
    ERRORS.with_label_values(&[stage, error_type]).inc();
}

/// Records stage latency
pub fn record_stage_latency(stage: &str, latency_secs: f64) {
    STAGE_LATENCY.with_label_values(&[stage]).observe(latency_secs);
}

pub fn record_http_response(route: &str, status: u16) {
    HTTP_RESPONSES
        .with_label_values(&[route, &status.to_string()])
        .inc();
}

// ============================================
// METRICS COLLECTION
// ============================================

/// Collects all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}

/// A timer for measuring stage latency
pub struct StageTimer {
    stage: &'static str,
    start: std::time::Instant,
}

impl StageTimer {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        record_stage_latency(self.stage, elapsed);
    }
}
