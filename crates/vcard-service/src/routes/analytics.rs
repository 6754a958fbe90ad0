use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, instrument};
use vcard_core::AppError;

use crate::app::AppState;
use crate::repository::{ScanRecord, ScanStats, TopContact};
use crate::views::DashboardPage;

#[derive(Debug, Serialize)]
pub struct GlobalAnalytics {
    #[serde(flatten)]
    pub stats: ScanStats,
    pub top_contacts: Vec<TopContact>,
}

#[derive(Debug, Serialize)]
pub struct ContactAnalytics {
    pub contact_id: String,
    pub name: String,
    #[serde(flatten)]
    pub stats: ScanStats,
}

// Analytics pages show empty numbers rather than failing when the scan table misbehaves.
async fn stats_or_empty(state: &AppState, contact_id: Option<&str>) -> ScanStats {
    state
        .logger
        .scans()
        .stats(contact_id)
        .await
        .unwrap_or_else(|e| {
            error!(?contact_id, "Failed to compute scan stats: {:?}", e);
            ScanStats::default()
        })
}

async fn top_or_empty(state: &AppState) -> Vec<TopContact> {
    state
        .logger
        .scans()
        .top_contacts()
        .await
        .unwrap_or_else(|e| {
            error!("Failed to rank contacts: {:?}", e);
            Vec::new()
        })
}

#[instrument(skip(state))]
pub async fn global_analytics(State(state): State<AppState>) -> Json<GlobalAnalytics> {
    Json(GlobalAnalytics {
        stats: stats_or_empty(&state, None).await,
        top_contacts: top_or_empty(&state).await,
    })
}

#[instrument(skip(state))]
pub async fn contact_analytics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContactAnalytics>, AppError> {
    let record = state.contacts.get(&id).await?;
    let stats = stats_or_empty(&state, Some(&id)).await;

    Ok(Json(ContactAnalytics {
        name: record.name().to_string(),
        contact_id: record.id,
        stats,
    }))
}

#[instrument(skip(state))]
pub async fn export_scans(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = state.contacts.get(&id).await?;
    let rows = state.logger.scans().export(&id).await?;

    let filename = format!(
        "analytics_{}_{}.csv",
        record.file_stem(),
        Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        scans_csv(&rows),
    )
        .into_response())
}

#[instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let stats = stats_or_empty(&state, None).await;
    let top_contacts = top_or_empty(&state).await;

    let page = DashboardPage {
        contact: None,
        stats: &stats,
        top_contacts: &top_contacts,
    };
    Ok(Html(state.views.dashboard(&page)?))
}

#[instrument(skip(state))]
pub async fn contact_dashboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let record = state.contacts.get(&id).await?;
    let stats = stats_or_empty(&state, Some(&id)).await;

    let page = DashboardPage {
        contact: Some(&record),
        stats: &stats,
        top_contacts: &[],
    };
    Ok(Html(state.views.dashboard(&page)?))
}

const CSV_HEADER: &str =
    "scan_id,scanned_at,device_type,ip_address,user_agent,referer,country,city,latitude,longitude,action";

fn scans_csv(rows: &[ScanRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            row.id.to_string(),
            row.scanned_at.to_rfc3339(),
            row.device_class.clone(),
            row.ip_address.clone().unwrap_or_default(),
            row.user_agent.clone().unwrap_or_default(),
            row.referer.clone().unwrap_or_default(),
            row.country.clone().unwrap_or_default(),
            row.city.clone().unwrap_or_default(),
            row.latitude.map(|v| v.to_string()).unwrap_or_default(),
            row.longitude.map(|v| v.to_string()).unwrap_or_default(),
            row.action.clone(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
