//! Provider contract, delivery outcome, and provider error types.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised inside a provider. They never cross the provider boundary
/// during a send; `send_email` folds them into a failed `DeliveryResult`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Outcome of a single send.
///
/// Exactly one of `message_id` / `error_detail` is present: successes carry
/// the provider-issued id, failures carry a human-readable reason. The fields
/// are private so the two constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,
}

impl DeliveryResult {
    /// Successful delivery. An empty id is replaced by an opaque local token.
    pub fn delivered(message_id: impl Into<String>) -> Self {
        let message_id = message_id.into();
        let message_id = if message_id.trim().is_empty() {
            opaque_message_id()
        } else {
            message_id
        };
        Self {
            success: true,
            message_id: Some(message_id),
            error_detail: None,
        }
    }

    /// Failed delivery with a reason.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }
}

impl From<Result<String, ProviderError>> for DeliveryResult {
    fn from(outcome: Result<String, ProviderError>) -> Self {
        match outcome {
            Ok(id) => DeliveryResult::delivered(id),
            Err(e) => DeliveryResult::failed(e.to_string()),
        }
    }
}

/// Token returned when a provider accepts a message without issuing an id.
pub fn opaque_message_id() -> String {
    format!("local-{}", Uuid::new_v4())
}

/// Transport to an external email service.
///
/// Implementations are constructed once with their credentials and are
/// stateless per call, so one instance serves every concurrent send.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver one HTML email. Every failure is reported through the result.
    async fn send_email(&self, to: &str, subject: &str, content: &str) -> DeliveryResult;

    /// Provider identifier used in logs and metrics.
    fn name(&self) -> &'static str;
}

/// Build the pooled HTTP client a provider keeps for its lifetime.
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("ara-mail-service/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))
}

pub(crate) fn require(value: &str, what: &str) -> Result<(), ProviderError> {
    if value.trim().is_empty() {
        return Err(ProviderError::Config(format!("{what} is empty")));
    }
    Ok(())
}
