use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::email::{preview_email, send_email};
use super::health::{health, stats};
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Email endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route("/emails/send", post(send_email))
                .route("/emails/preview", post(preview_email)),
        )
}
