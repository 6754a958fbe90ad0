use axum::{
    Form,
    extract::State,
    response::Html,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use vcard_core::{AppError, ContactFields, QrFormat, qr};

use crate::app::AppState;
use crate::views::{Download, SuccessPage};

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub name: String,
    pub company: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// `url` or `vcard`. Recorded on the page only; codes always carry the card text.
    #[serde(default = "default_qr_mode")]
    pub qr_mode: String,
}

fn default_qr_mode() -> String {
    "url".to_string()
}

impl GenerateForm {
    /// Trimmed contact fields, blank optional values dropped, plus the mode.
    fn fields(self) -> (ContactFields, String) {
        let fields = ContactFields {
            name: self.name,
            company: self.company,
            title: self.title,
            email: self.email,
            phone: self.phone,
            website: self.website,
        }
        .normalized();
        (fields, self.qr_mode)
    }
}

#[instrument(skip(state))]
pub async fn form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    Ok(Html(state.views.form()?))
}

#[instrument(skip_all)]
pub async fn generate(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Html<String>, AppError> {
    let (fields, qr_mode) = form.fields();
    let record = state.contacts.create(fields).await?;

    let mut downloads = Vec::with_capacity(QrFormat::ALL.len());
    let mut svg_preview = None;
    for format in QrFormat::ALL {
        match qr::render(&record.card_text, format, &state.render_options) {
            Ok(bytes) => {
                if format == QrFormat::Svg {
                    svg_preview = String::from_utf8(bytes).ok();
                }
                downloads.push(Download::new(format, true));
            }
            Err(e) => {
                warn!(id = %record.id, %format, "Failed to render QR code: {}", e);
                downloads.push(Download::new(format, false));
            }
        }
    }

    info!(id = %record.id, "Contact card generated");

    let page = SuccessPage {
        contact: &record,
        vcard_filename: record.card_filename(),
        scan_url: format!("{}/scan/{}", state.base_url, record.id),
        qr_mode: &qr_mode,
        svg_preview,
        downloads,
    };
    Ok(Html(state.views.success(&page)?))
}
