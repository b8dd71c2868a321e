//! Delivery provider factory

use std::sync::Arc;

use crate::config::{EmailConfig, ProviderKind};

use super::mailgun::MailgunProvider;
use super::sendgrid::SendGridProvider;
use super::types::{EmailProvider, ProviderError};

/// Create the delivery provider selected by `email.provider`.
///
/// Called once at startup; the returned instance is shared by every send.
/// Missing credentials are reported here rather than on the first send.
pub fn create_email_provider(config: &EmailConfig) -> Result<Arc<dyn EmailProvider>, ProviderError> {
    let provider: Arc<dyn EmailProvider> = match config.provider {
        ProviderKind::SendGrid => Arc::new(SendGridProvider::from_config(config)?),
        ProviderKind::Mailgun => Arc::new(MailgunProvider::from_config(config)?),
    };

    tracing::info!(
        provider = provider.name(),
        from_address = %config.from_address,
        timeout_seconds = config.request_timeout_seconds,
        "Email provider configured"
    );

    Ok(provider)
}
