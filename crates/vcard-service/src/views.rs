//! HTML pages rendered with minijinja.

use std::sync::Arc;

use minijinja::Environment;
use serde::Serialize;
use vcard_core::{AppError, ContactRecord, QrFormat};

use crate::repository::{ScanStats, TopContact};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("form.html", include_str!("../templates/form.html")),
    ("success.html", include_str!("../templates/success.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
];

/// One code variant offered on the success page.
#[derive(Debug, Clone, Serialize)]
pub struct Download {
    pub format: &'static str,
    pub available: bool,
}

impl Download {
    #[must_use]
    pub fn new(format: QrFormat, available: bool) -> Self {
        Self {
            format: format.extension(),
            available,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessPage<'a> {
    pub contact: &'a ContactRecord,
    pub vcard_filename: String,
    pub scan_url: String,
    pub qr_mode: &'a str,
    pub svg_preview: Option<String>,
    pub downloads: Vec<Download>,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage<'a> {
    pub contact: Option<&'a ContactRecord>,
    pub stats: &'a ScanStats,
    pub top_contacts: &'a [TopContact],
}

/// Compiled page templates.
#[derive(Clone)]
pub struct Views {
    env: Arc<Environment<'static>>,
}

impl Views {
    pub fn new() -> Result<Self, AppError> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source).map_err(template_error)?;
        }
        Ok(Self { env: Arc::new(env) })
    }

    pub fn form(&self) -> Result<String, AppError> {
        self.render("form.html", minijinja::context! {})
    }

    pub fn success(&self, page: &SuccessPage<'_>) -> Result<String, AppError> {
        self.render("success.html", page)
    }

    pub fn dashboard(&self, page: &DashboardPage<'_>) -> Result<String, AppError> {
        self.render("dashboard.html", page)
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, AppError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(template_error)
    }
}

fn template_error(e: minijinja::Error) -> AppError {
    AppError::Template(e.to_string())
}
