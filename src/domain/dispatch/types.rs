//! Dispatch request, intermediate and error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::DeliveryResult;
use crate::render::{deserialize_template_data, RenderError, TemplateData};
use crate::template::TemplateError;

/// One templated send. Caller-owned and consumed by a single `send` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Destination email address
    pub recipient: String,

    /// Id of the stored template to render
    #[serde(alias = "template_id")]
    pub template_id: String,

    /// Variables substituted into subject and body
    #[serde(default, deserialize_with = "deserialize_template_data")]
    pub data: TemplateData,
}

impl SendRequest {
    pub fn new(recipient: impl Into<String>, template_id: impl Into<String>, data: TemplateData) -> Self {
        Self {
            recipient: recipient.into(),
            template_id: template_id.into(),
            data,
        }
    }
}

/// Subject and body after rendering, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

/// Every way a send can fail before the message reaches a provider.
///
/// Provider failures are not represented here: providers fold them into a
/// failed `DeliveryResult` themselves.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template store unavailable: {0}")]
    Storage(String),

    #[error("render error: {0}")]
    Render(String),
}

impl DispatchError {
    /// Pipeline stage the failure belongs to, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            DispatchError::TemplateNotFound(_) | DispatchError::Storage(_) => "lookup",
            DispatchError::Render(_) => "render",
        }
    }
}

impl From<TemplateError> for DispatchError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(id) => DispatchError::TemplateNotFound(id),
            other => DispatchError::Storage(other.to_string()),
        }
    }
}

impl From<RenderError> for DispatchError {
    fn from(err: RenderError) -> Self {
        DispatchError::Render(err.0)
    }
}

impl From<DispatchError> for DeliveryResult {
    fn from(err: DispatchError) -> Self {
        DeliveryResult::failed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_accepts_both_id_spellings() {
        let camel: SendRequest = serde_json::from_str(
            r#"{"recipient":"ana@example.com","templateId":"welcome","data":{"name":"Ana"}}"#,
        )
        .unwrap();
        assert_eq!(camel.template_id, "welcome");
        assert_eq!(camel.data["name"], "Ana");

        let snake: SendRequest =
            serde_json::from_str(r#"{"recipient":"ana@example.com","template_id":"welcome"}"#)
                .unwrap();
        assert_eq!(snake.template_id, "welcome");
        assert!(snake.data.is_empty());
    }

    #[test]
    fn test_non_object_data_is_empty_context() {
        for payload in [r#""data":null"#, r#""data":[1,2]"#, r#""data":"Ana""#] {
            let request: SendRequest = serde_json::from_str(&format!(
                r#"{{"recipient":"ana@example.com","templateId":"welcome",{}}}"#,
                payload
            ))
            .unwrap();
            assert!(request.data.is_empty());
        }
    }

    #[test]
    fn test_template_errors_map_by_kind() {
        let missing = DispatchError::from(TemplateError::NotFound("welcome".to_string()));
        assert!(matches!(missing, DispatchError::TemplateNotFound(ref id) if id == "welcome"));
        assert_eq!(missing.stage(), "lookup");

        let storage = DispatchError::from(TemplateError::Storage("pool timed out".to_string()));
        assert!(matches!(storage, DispatchError::Storage(_)));
    }

    #[test]
    fn test_failure_result_messages() {
        let result = DeliveryResult::from(DispatchError::TemplateNotFound("welcome".to_string()));
        assert!(!result.is_success());
        assert_eq!(result.error_detail(), Some("template not found: welcome"));

        let result = DeliveryResult::from(DispatchError::from(RenderError(
            "syntax error: unexpected end of input".to_string(),
        )));
        assert!(result.error_detail().unwrap().starts_with("render error"));
    }
}
