use std::net::SocketAddr;

use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use vcard_core::{AppError, Location, ScanMetadata};

use crate::app::AppState;
use crate::tracking::SCAN_ACTION;

#[derive(Debug, Default, Deserialize)]
pub struct TrackRequest {
    pub location: Option<Location>,
    pub action: Option<String>,
}

impl TrackRequest {
    /// Anything that is not a valid request body counts as an empty one.
    fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|e| {
            debug!("Ignoring tracking body: {}", e);
            Self::default()
        })
    }

    fn action(&self) -> &str {
        self.action
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(SCAN_ACTION)
    }
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub success: bool,
    pub message: &'static str,
}

#[instrument(skip(state, headers, body))]
pub async fn track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> Result<Json<TrackResponse>, AppError> {
    let request = TrackRequest::parse(&body);
    let meta = ScanMetadata::from_headers(&headers, Some(addr.ip()));

    let outcome = state
        .logger
        .log_scan(&id, &meta, request.location.as_ref(), request.action())
        .await?;
    debug!(recorded = outcome.is_recorded(), "Tracking event handled");

    Ok(Json(TrackResponse {
        success: true,
        message: "Scan tracked successfully",
    }))
}
