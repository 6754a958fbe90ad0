use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service_name: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    database: &'static str,
}

/// Liveness probe.
#[instrument]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service_name: env!("CARGO_PKG_NAME"),
    })
}

/// Readiness probe; fails while the database is unreachable.
#[instrument(skip(state))]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let probe = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(state.logger.scans().pool())
        .await;

    match probe {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready",
                database: "ok",
            }),
        ),
        Err(e) => {
            warn!("Readiness check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "not ready",
                    database: "unavailable",
                }),
            )
        }
    }
}
