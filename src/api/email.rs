//! Email send and preview endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::dispatch::{RenderedEmail, SendRequest};
use crate::error::{AppError, Result};
use crate::provider::DeliveryResult;
use crate::render::{deserialize_template_data, TemplateData};
use crate::server::AppState;

/// Request to render a template without sending it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    #[serde(alias = "template_id")]
    pub template_id: String,
    #[serde(default, deserialize_with = "deserialize_template_data")]
    pub data: TemplateData,
}

/// POST /api/v1/emails/send
///
/// Answers 200 with the delivery outcome whenever the request is well formed,
/// including when the template is missing or the provider refused the mail.
#[tracing::instrument(
    name = "http.send_email",
    skip(state, request),
    fields(template_id = %request.template_id)
)]
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<DeliveryResult>> {
    require_field(&request.recipient, "recipient")?;
    require_field(&request.template_id, "templateId")?;

    Ok(Json(state.dispatcher.send(request).await))
}

/// POST /api/v1/emails/preview
#[tracing::instrument(
    name = "http.preview_email",
    skip(state, request),
    fields(template_id = %request.template_id)
)]
pub async fn preview_email(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<RenderedEmail>> {
    require_field(&request.template_id, "templateId")?;

    let rendered = state
        .dispatcher
        .render_preview(&request.template_id, &request.data)
        .await?;
    Ok(Json(rendered))
}

fn require_field(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} is required")));
    }
    Ok(())
}
