use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::metrics::DispatchMetrics;
use crate::provider::{DeliveryResult, EmailProvider};
use crate::render::{TemplateData, TemplateEngine};
use crate::telemetry::attributes;
use crate::template::TemplateRepository;

use super::{DispatchError, RenderedEmail, SendRequest};

/// Statistics for the email dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Total send requests received
    pub total_requests: AtomicU64,
    /// Sends the provider accepted
    pub delivered: AtomicU64,
    /// Sends naming an unknown template
    pub template_not_found: AtomicU64,
    /// Sends aborted because the template store failed
    pub storage_failures: AtomicU64,
    /// Sends aborted by malformed template text
    pub render_failures: AtomicU64,
    /// Sends the provider refused or could not reach
    pub delivery_failures: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            template_not_found: self.template_not_found.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_requests: u64,
    pub delivered: u64,
    pub template_not_found: u64,
    pub storage_failures: u64,
    pub render_failures: u64,
    pub delivery_failures: u64,
}

/// Looks up a template, renders it, and hands the result to the bound provider.
///
/// Holds no per-request state; a single instance is shared across all
/// concurrent sends.
pub struct EmailDispatcher {
    repository: Arc<dyn TemplateRepository>,
    engine: Arc<dyn TemplateEngine>,
    provider: Arc<dyn EmailProvider>,
    stats: DispatcherStats,
}

impl EmailDispatcher {
    pub fn new(
        repository: Arc<dyn TemplateRepository>,
        engine: Arc<dyn TemplateEngine>,
        provider: Arc<dyn EmailProvider>,
    ) -> Self {
        Self {
            repository,
            engine,
            provider,
            stats: DispatcherStats::default(),
        }
    }

    /// Send one templated email.
    ///
    /// Never fails at the call level: lookup, render and delivery failures all
    /// come back as a failed `DeliveryResult`. The provider is only called
    /// once both subject and body rendered successfully, and its result is
    /// returned unchanged.
    #[tracing::instrument(
        name = "dispatcher.send",
        skip(self, request),
        fields(
            template_id = %request.template_id,
            recipient_domain = recipient_domain(&request.recipient),
            provider = self.provider.name(),
        )
    )]
    pub async fn send(&self, request: SendRequest) -> DeliveryResult {
        self.stats.total_requests.fetch_add(1, Ordering::Relaxed);

        let rendered = match self.prepare(&request.template_id, &request.data).await {
            Ok(rendered) => rendered,
            Err(e) => {
                self.record_failure(&e);
                tracing::warn!(stage = e.stage(), error = %e, "Email not sent");
                set_span_attribute(attributes::outcome(false));
                return e.into();
            }
        };

        let result = self
            .provider
            .send_email(&request.recipient, &rendered.subject, &rendered.body)
            .await;

        set_span_attribute(attributes::outcome(result.is_success()));
        if let Some(id) = result.message_id() {
            set_span_attribute(attributes::message_id(id));
        }

        if result.is_success() {
            self.stats.delivered.fetch_add(1, Ordering::Relaxed);
            DispatchMetrics::record_delivered();
            tracing::info!(message_id = ?result.message_id(), "Email delivered");
        } else {
            self.stats.delivery_failures.fetch_add(1, Ordering::Relaxed);
            DispatchMetrics::record_delivery_failure();
            tracing::warn!(
                stage = "delivery",
                error = ?result.error_detail(),
                "Email not sent"
            );
        }

        result
    }

    /// Look up and render a template without delivering it.
    pub async fn render_preview(
        &self,
        template_id: &str,
        data: &TemplateData,
    ) -> Result<RenderedEmail, DispatchError> {
        self.prepare(template_id, data).await
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Name of the provider bound at startup
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Name of the template store backend
    pub fn repository_backend(&self) -> &'static str {
        self.repository.backend_name()
    }

    async fn prepare(
        &self,
        template_id: &str,
        data: &TemplateData,
    ) -> Result<RenderedEmail, DispatchError> {
        let template = self.repository.find_by_id(template_id).await?;

        // Subject and body are independent; wait for both before delivering.
        let (subject, body) = futures::future::try_join(
            self.engine.render_subject(&template.subject, data),
            self.engine.render(&template.content, data),
        )
        .await?;

        Ok(RenderedEmail { subject, body })
    }

    fn record_failure(&self, err: &DispatchError) {
        match err {
            DispatchError::TemplateNotFound(_) => {
                self.stats.template_not_found.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_template_not_found();
            }
            DispatchError::Storage(_) => {
                self.stats.storage_failures.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_storage_failure();
            }
            DispatchError::Render(_) => {
                self.stats.render_failures.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_render_failure();
            }
        }
    }
}

fn set_span_attribute(attribute: opentelemetry::KeyValue) {
    tracing::Span::current().set_attribute(attribute.key, attribute.value);
}

/// Domain part of an address, so logs never carry the full recipient.
fn recipient_domain(recipient: &str) -> &str {
    recipient
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .unwrap_or("")
}
