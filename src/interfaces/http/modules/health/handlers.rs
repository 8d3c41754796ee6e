//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use futures_util::future::join_all;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::GameMode;
use crate::infrastructure::database::ping;

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub databases: Vec<(GameMode, DatabaseConnection)>,
    pub started_at: Arc<Instant>,
}

/// Service health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub databases: Vec<DatabaseHealth>,
}

/// Per game mode database health
#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub mode: GameMode,
    #[schema(example = "ok")]
    pub status: String,
    pub latency_ms: Option<u64>,
}

async fn check(mode: GameMode, db: &DatabaseConnection) -> DatabaseHealth {
    let start = Instant::now();
    match ping(db).await {
        Ok(()) => DatabaseHealth {
            mode,
            status: "ok".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            warn!(%mode, error = %e, "Database health check failed");
            DatabaseHealth {
                mode,
                status: "error".to_string(),
                latency_ms: None,
            }
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is degraded", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let databases = join_all(state.databases.iter().map(|(mode, db)| check(*mode, db))).await;
    let healthy = databases.iter().all(|d| d.status == "ok");

    let (http_status, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            databases,
        }),
    )
}
