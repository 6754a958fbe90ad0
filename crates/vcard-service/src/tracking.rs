//! Best-effort scan logging.

use tracing::{info, instrument, warn};
use vcard_core::{AppError, Location, ScanMetadata};

use crate::repository::ScanRepository;
use crate::store::ContactStore;

/// Default action label for scan events.
pub const SCAN_ACTION: &str = "scan";

/// What happened to a scan event after the contact was confirmed to exist.
#[must_use]
#[derive(Debug)]
pub enum LogOutcome {
    /// The event was appended under `scan_id`.
    Recorded { scan_id: i64 },
    /// Storage failed; the event was dropped and the failure logged.
    Dropped { reason: AppError },
}

impl LogOutcome {
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

#[derive(Clone)]
pub struct ScanLogger {
    contacts: ContactStore,
    scans: ScanRepository,
}

impl ScanLogger {
    #[must_use]
    pub fn new(contacts: ContactStore, scans: ScanRepository) -> Self {
        Self { contacts, scans }
    }

    #[must_use]
    pub fn scans(&self) -> &ScanRepository {
        &self.scans
    }

    /// Appends one scan event for `contact_id`.
    ///
    /// An unknown contact is the caller's error and nothing is written.
    /// Storage failures never surface as `Err`; they come back as
    /// [`LogOutcome::Dropped`] so the download can go ahead regardless.
    #[instrument(skip(self, meta, location))]
    pub async fn log_scan(
        &self,
        contact_id: &str,
        meta: &ScanMetadata,
        location: Option<&Location>,
        action: &str,
    ) -> Result<LogOutcome, AppError> {
        match self.contacts.find(contact_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(AppError::NotFound(format!(
                    "Contact '{contact_id}' not found"
                )));
            }
            Err(reason) => {
                warn!("Could not verify contact before logging scan: {:?}", reason);
                return Ok(LogOutcome::Dropped { reason });
            }
        }

        match self.scans.insert(contact_id, meta, location, action).await {
            Ok(scan_id) => {
                info!(
                    scan_id,
                    device_class = %meta.device_class,
                    "Scan recorded"
                );
                Ok(LogOutcome::Recorded { scan_id })
            }
            Err(reason) => {
                warn!("Failed to record scan: {:?}", reason);
                Ok(LogOutcome::Dropped { reason })
            }
        }
    }
}
