pub mod card;
pub mod config;
pub mod contact;
pub mod error;
pub mod qr;
pub mod scan;
pub mod telemetry;

pub use contact::{ContactFields, ContactRecord};
pub use error::{AppError, Result};
pub use qr::{QrError, QrFormat, RenderOptions};
pub use scan::{DeviceClass, Location, ScanMetadata};
