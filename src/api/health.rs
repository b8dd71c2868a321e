//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::dispatch::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub provider: String,
    pub template_backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub status: String,
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub provider: String,
    pub dispatch: DispatcherStatsSnapshot,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = (chrono::Utc::now() - state.started_at)
        .num_seconds()
        .max(0) as u64;

    let postgres = match state.postgres {
        Some(ref pool) => {
            let connected = pool.health_check().await.is_ok();
            Some(PostgresHealthResponse {
                status: if connected { "connected" } else { "unreachable" }.to_string(),
                connected,
                pool_size: pool.max_connections(),
                idle_connections: pool.idle_connections(),
            })
        }
        None => None,
    };

    let is_healthy = postgres.as_ref().map_or(true, |pg| pg.connected);
    let status = if is_healthy { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        provider: state.dispatcher.provider_name().to_string(),
        template_backend: state.dispatcher.repository_backend().to_string(),
        postgres,
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        provider: state.dispatcher.provider_name().to_string(),
        dispatch: state.dispatcher.stats(),
    })
}
