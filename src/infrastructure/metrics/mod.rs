//! Prometheus metrics for the mail service.
//!
//! - Dispatch outcome counters (delivered, template missing, render/delivery failure)
//! - Provider request counters and latency per provider
//! - Template store lookup latency

mod helpers;

pub use helpers::{encode_metrics, DispatchMetrics, ProviderMetrics, StoreMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara_mail";

lazy_static! {
    /// Send calls by terminal outcome
    pub static ref DISPATCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatch_total", METRIC_PREFIX),
        "Total templated send calls by outcome",
        &["outcome"]
    ).unwrap();

    /// Provider API calls by provider and status class
    pub static ref PROVIDER_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_provider_requests_total", METRIC_PREFIX),
        "Total delivery provider API requests",
        &["provider", "status"]
    ).unwrap();

    /// Provider API round-trip latency
    pub static ref PROVIDER_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_provider_latency_seconds", METRIC_PREFIX),
        "Delivery provider request latency in seconds",
        &["provider"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    /// Template lookup latency by store backend
    pub static ref TEMPLATE_LOOKUP_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_template_lookup_seconds", METRIC_PREFIX),
        "Template store lookup latency in seconds",
        &["backend"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]
    ).unwrap();
}
