//! Template types and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum subject length (RFC 5322 line limit, excluding CRLF)
const MAX_SUBJECT_LEN: usize = 998;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid template ID: {0}")]
    InvalidId(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Template storage failed: {0}")]
    Storage(String),

    #[error("Template seed failed: {0}")]
    Seed(String),
}

impl From<sqlx::Error> for TemplateError {
    fn from(err: sqlx::Error) -> Self {
        TemplateError::Storage(err.to_string())
    }
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A stored email template.
///
/// `subject` and `content` hold template text with `{{ variable }}` placeholders.
/// `metadata` is carried along for administrative tooling and never
/// interpreted during dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Unique template identifier (alphanumeric, dash, underscore)
    pub id: String,

    /// Subject line template
    pub subject: String,

    /// HTML body template
    pub content: String,

    /// Opaque metadata, any JSON value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Template {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Validate the template
    pub fn validate(&self) -> TemplateResult<()> {
        if self.id.is_empty() || self.id.len() > 64 {
            return Err(TemplateError::InvalidId(
                "ID must be 1-64 characters".to_string(),
            ));
        }

        if !self
            .id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TemplateError::InvalidId(
                "ID must contain only alphanumeric, dash, or underscore".to_string(),
            ));
        }

        if self.subject.trim().is_empty() || self.subject.len() > MAX_SUBJECT_LEN {
            return Err(TemplateError::InvalidTemplate(format!(
                "Subject must be 1-{} characters",
                MAX_SUBJECT_LEN
            )));
        }

        if self.content.trim().is_empty() {
            return Err(TemplateError::InvalidTemplate(
                "Content must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
