//! Render engine contract.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Variables available to a template: name -> arbitrary JSON value.
pub type TemplateData = serde_json::Map<String, serde_json::Value>;

/// Serde helper for request payloads: anything other than a JSON object
/// (including `null`) becomes an empty context.
pub fn deserialize_template_data<'de, D>(deserializer: D) -> Result<TemplateData, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(map) => map,
        _ => TemplateData::new(),
    })
}

/// Raised only for malformed template text, never for missing data keys.
#[derive(Debug, Error)]
#[error("Template rendering failed: {0}")]
pub struct RenderError(pub String);

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Renders template text against request data.
///
/// Both operations are pure functions of their inputs, so subject and body
/// may be rendered concurrently from the same template and data.
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// Render a body template verbatim.
    async fn render(&self, template: &str, data: &TemplateData) -> RenderResult<String>;

    /// Render a subject template as a single trimmed line.
    async fn render_subject(&self, template: &str, data: &TemplateData) -> RenderResult<String>;

    /// Engine identifier used in logs.
    fn engine_name(&self) -> &'static str;
}
