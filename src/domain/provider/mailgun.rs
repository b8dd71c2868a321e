//! Mailgun Messages API provider.
//!
//! `POST {base_url}/v3/{domain}/messages` with HTTP basic auth (`api:<key>`)
//! and a form-encoded body. Success returns `{"id": "<...>", "message": "Queued. Thank you."}`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::EmailConfig;
use crate::metrics::ProviderMetrics;

use super::types::{
    build_http_client, opaque_message_id, require, DeliveryResult, EmailProvider, ProviderError,
};

const PROVIDER_NAME: &str = "mailgun";

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Delivers email through the Mailgun HTTP API.
#[derive(Debug)]
pub struct MailgunProvider {
    client: reqwest::Client,
    api_key: String,
    from_address: String,
    endpoint: String,
}

impl MailgunProvider {
    /// Create a provider for one sending domain.
    ///
    /// `base_url` is `https://api.mailgun.net`, or `https://api.eu.mailgun.net`
    /// for EU domains.
    pub fn new(
        api_key: impl Into<String>,
        domain: &str,
        from_address: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        let from_address = from_address.into();
        require(&api_key, "Mailgun API key")?;
        require(domain, "Mailgun domain")?;
        require(&from_address, "sender address")?;
        require(base_url, "Mailgun base URL")?;

        Ok(Self {
            client: build_http_client(timeout)?,
            api_key,
            from_address,
            endpoint: format!(
                "{}/v3/{}/messages",
                base_url.trim_end_matches('/'),
                domain.trim()
            ),
        })
    }

    pub fn from_config(config: &EmailConfig) -> Result<Self, ProviderError> {
        Self::new(
            config.mailgun.api_key.clone(),
            &config.mailgun.domain,
            config.from_address.clone(),
            &config.mailgun.base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    async fn deliver(&self, to: &str, subject: &str, content: &str) -> Result<String, ProviderError> {
        let form = [
            ("from", self.from_address.as_str()),
            ("to", to),
            ("subject", subject),
            ("html", content),
        ];

        let started = Instant::now();
        let response = match self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
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

        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        if status.is_success() {
            // Accepted either way; an unreadable body only costs us the id
            let id = match serde_json::from_str::<SendResponse>(&body_text) {
                Ok(parsed) => parsed.id,
                Err(e) => {
                    tracing::warn!(
                        provider = PROVIDER_NAME,
                        error = %e,
                        "Accepted response without a parseable id"
                    );
                    None
                }
            };
            return Ok(id
                .as_deref()
                .map(strip_angle_brackets)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(opaque_message_id));
        }

        Err(ProviderError::Rejected {
            status: status.as_u16(),
            detail: error_detail(status, &body_text),
        })
    }
}

/// Mailgun ids look like `<20240101.1@mg.example.com>`.
fn strip_angle_brackets(id: &str) -> &str {
    id.trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
}

fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{}: {}", status, body.trim()),
    }
}

#[async_trait]
impl EmailProvider for MailgunProvider {
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

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_strip_angle_brackets() {
        assert_eq!(
            strip_angle_brackets("<20240101.1@mg.example.com>"),
            "20240101.1@mg.example.com"
        );
        assert_eq!(strip_angle_brackets("plain-id"), "plain-id");
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(StatusCode::FORBIDDEN, r#"{"message": "Domain not allowed"}"#),
            "Domain not allowed"
        );
        assert_eq!(
            error_detail(StatusCode::UNAUTHORIZED, "Forbidden"),
            "401 Unauthorized: Forbidden"
        );
        assert_eq!(
            error_detail(StatusCode::INTERNAL_SERVER_ERROR, " "),
            "500 Internal Server Error"
        );
    }

    #[test]
    fn test_new_requires_domain() {
        let timeout = Duration::from_secs(5);
        let err = MailgunProvider::new(
            "key-1",
            "",
            "noreply@example.com",
            "https://api.mailgun.net",
            timeout,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Mailgun domain"));
    }

    #[test]
    fn test_endpoint_includes_domain() {
        let provider = MailgunProvider::new(
            "key-1",
            "mg.example.com",
            "noreply@example.com",
            "https://api.eu.mailgun.net/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            provider.endpoint,
            "https://api.eu.mailgun.net/v3/mg.example.com/messages"
        );
        assert_eq!(provider.name(), "mailgun");
    }
}
