//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{DISPATCH_TOTAL, PROVIDER_LATENCY, PROVIDER_REQUESTS_TOTAL, TEMPLATE_LOOKUP_LATENCY};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatch outcomes
pub struct DispatchMetrics;

impl DispatchMetrics {
    pub fn record_delivered() {
        DISPATCH_TOTAL.with_label_values(&["delivered"]).inc();
    }

    pub fn record_template_not_found() {
        DISPATCH_TOTAL.with_label_values(&["template_not_found"]).inc();
    }

    pub fn record_storage_failure() {
        DISPATCH_TOTAL.with_label_values(&["storage_failure"]).inc();
    }

    pub fn record_render_failure() {
        DISPATCH_TOTAL.with_label_values(&["render_failure"]).inc();
    }

    pub fn record_delivery_failure() {
        DISPATCH_TOTAL.with_label_values(&["delivery_failure"]).inc();
    }
}

/// Helper struct for recording provider API calls
pub struct ProviderMetrics;

impl ProviderMetrics {
    /// Record one provider round-trip. `status` is the HTTP status code,
    /// or `None` when the request never got a response.
    pub fn record_request(provider: &str, status: Option<u16>, elapsed: Duration) {
        let status_label = match status {
            Some(code) if (200..300).contains(&code) => "2xx",
            Some(code) if (400..500).contains(&code) => "4xx",
            Some(code) if code >= 500 => "5xx",
            Some(_) => "other",
            None => "transport_error",
        };
        PROVIDER_REQUESTS_TOTAL
            .with_label_values(&[provider, status_label])
            .inc();
        PROVIDER_LATENCY
            .with_label_values(&[provider])
            .observe(elapsed.as_secs_f64());
    }
}

/// Helper struct for recording template store lookups
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn record_lookup(backend: &str, elapsed: Duration) {
        TEMPLATE_LOOKUP_LATENCY
            .with_label_values(&[backend])
            .observe(elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_encode() {
        DispatchMetrics::record_delivered();
        ProviderMetrics::record_request("sendgrid", Some(202), Duration::from_millis(40));
        ProviderMetrics::record_request("mailgun", None, Duration::from_millis(5));

        let output = encode_metrics().unwrap();
        assert!(output.contains("ara_mail_dispatch_total"));
        assert!(output.contains("ara_mail_provider_requests_total"));
        assert!(output.contains("transport_error"));
    }
}
