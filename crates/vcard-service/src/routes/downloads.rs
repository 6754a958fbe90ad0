use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, instrument, warn};
use vcard_core::card::CARD_CONTENT_TYPE;
use vcard_core::{AppError, ContactRecord, QrFormat, ScanMetadata, qr};

use crate::app::AppState;
use crate::tracking::{LogOutcome, SCAN_ACTION};

fn attachment(content_type: &str, filename: &str, body: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn card_attachment(record: &ContactRecord) -> Response {
    attachment(
        CARD_CONTENT_TYPE,
        &record.card_filename(),
        record.card_text.clone(),
    )
}

/// Target of the printed code: logs the scan and hands out the card.
#[instrument(skip(state, headers))]
pub async fn scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let record = state.contacts.get(&id).await?;

    let meta = ScanMetadata::from_headers(&headers, Some(addr.ip()));
    match state.logger.log_scan(&id, &meta, None, SCAN_ACTION).await {
        Ok(LogOutcome::Recorded { scan_id }) => debug!(scan_id, "Scan logged"),
        Ok(LogOutcome::Dropped { reason }) => debug!(%reason, "Scan dropped"),
        Err(e) => warn!("Scan not logged: {}", e),
    }

    info!(id = %id, "Serving contact card");
    Ok(card_attachment(&record))
}

#[instrument(skip(state))]
pub async fn vcard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = state.contacts.get(&id).await?;
    Ok(card_attachment(&record))
}

/// `GET /qr/{id}.{format}`; the whole file name is captured as one segment.
#[instrument(skip(state))]
pub async fn qr_code(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let (id, extension) = file.rsplit_once('.').unwrap_or((file.as_str(), ""));
    let record = state.contacts.get(id).await?;
    let format: QrFormat = extension.parse()?;

    let bytes = qr::render(&record.card_text, format, &state.render_options)?;
    let filename = format!("qr_{}.{}", record.file_stem(), format.extension());
    Ok(attachment(format.content_type(), &filename, bytes))
}
