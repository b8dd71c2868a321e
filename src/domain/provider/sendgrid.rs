//! SendGrid v3 Mail Send provider.
//!
//! `POST {base_url}/v3/mail/send` with a bearer token. SendGrid answers
//! `202 Accepted` with an empty body and reports the message id in the
//! `X-Message-Id` header.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmailConfig;
use crate::metrics::ProviderMetrics;

use super::types::{
    build_http_client, opaque_message_id, require, DeliveryResult, EmailProvider, ProviderError,
};

const PROVIDER_NAME: &str = "sendgrid";
const MESSAGE_ID_HEADER: &str = "x-message-id";

#[derive(Serialize)]
struct MailSendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Deserialize)]
struct ErrorItem {
    message: String,
    #[serde(default)]
    field: Option<String>,
}

/// Delivers email through the SendGrid HTTP API.
#[derive(Debug)]
pub struct SendGridProvider {
    client: reqwest::Client,
    api_key: String,
    from_address: String,
    endpoint: String,
}

impl SendGridProvider {
    /// Create a provider for the given credentials.
    ///
    /// `base_url` is normally `https://api.sendgrid.com`.
    pub fn new(
        api_key: impl Into<String>,
        from_address: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        let from_address = from_address.into();
        require(&api_key, "SendGrid API key")?;
        require(&from_address, "sender address")?;
        require(base_url, "SendGrid base URL")?;

        Ok(Self {
            client: build_http_client(timeout)?,
            api_key,
            from_address,
            endpoint: format!("{}/v3/mail/send", base_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(config: &EmailConfig) -> Result<Self, ProviderError> {
        Self::new(
            config.sendgrid.api_key.clone(),
            config.from_address.clone(),
            &config.sendgrid.base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    async fn deliver(&self, to: &str, subject: &str, content: &str) -> Result<String, ProviderError> {
        let body = MailSendRequest {
            personalizations: [Personalization {
                to: [Address { email: to }],
            }],
            from: Address {
                email: &self.from_address,
            },
            subject,
            content: [Content {
                content_type: "text/html",
                value: content,
            }],
        };

        let started = Instant::now();
        let response = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                ProviderMetrics::record_request(PROVIDER_NAME, None, started.elapsed());
                return Err(e.into());
            }
        };

        let status = response.status();
        ProviderMetrics::record_request(PROVIDER_NAME, Some(status.as_u16()), started.elapsed());

        if status.is_success() {
            let message_id = response
                .headers()
                .get(MESSAGE_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(opaque_message_id);
            return Ok(message_id);
        }

        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        Err(ProviderError::Rejected {
            status: status.as_u16(),
            detail: error_detail(status, &body_text),
        })
    }
}

/// Join the `errors[].message` entries of a SendGrid error body.
fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .into_iter()
            .map(|item| match item.field {
                Some(field) => format!("{} ({})", item.message, field),
                None => item.message,
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ if body.trim().is_empty() => status.to_string(),
        _ => format!("{}: {}", status, body.trim()),
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send_email(&self, to: &str, subject: &str, content: &str) -> DeliveryResult {
        let outcome = self.deliver(to, subject, content).await;

        match &outcome {
            Ok(message_id) => tracing::debug!(
                provider = PROVIDER_NAME,
                message_id = %message_id,
                "Email accepted"
            ),
            Err(e) => tracing::warn!(
                provider = PROVIDER_NAME,
                error = %e,
                "Email delivery failed"
            ),
        }

        outcome.into()
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
