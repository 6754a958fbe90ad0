mod analytics;
mod downloads;
mod health;
mod pages;
mod track;

pub use analytics::{
    contact_analytics, contact_dashboard, dashboard, export_scans, global_analytics,
};
pub use downloads::{qr_code, scan, vcard};
pub use health::{health, ready};
pub use pages::{form, generate};
pub use track::track;
