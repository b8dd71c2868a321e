//! Email delivery providers.
//!
//! `EmailProvider` is the single capability the dispatcher delivers through.
//! One concrete type exists per backend:
//!
//! - `SendGridProvider`: SendGrid v3 Mail Send API
//! - `MailgunProvider`: Mailgun Messages API
//!
//! Use `create_email_provider()` to build the configured backend at startup.

mod factory;
mod mailgun;
mod sendgrid;
mod types;

pub use factory::create_email_provider;
pub use mailgun::MailgunProvider;
pub use sendgrid::SendGridProvider;
pub use types::{opaque_message_id, DeliveryResult, EmailProvider, ProviderError};
