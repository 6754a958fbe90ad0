//! Two-tier contact storage.
//!
//! [`ContactStore`] writes through to both tiers and reads through the cache,
//! falling back to the durable tier and repopulating the cache on a hit.

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};
use uuid::Uuid;
use vcard_core::{AppError, ContactFields, ContactRecord};

pub use memory::MemoryContacts;
pub use sqlite::SqliteContacts;

/// One storage tier for contact records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactBackend: Send + Sync {
    /// Inserts or replaces the record stored under `record.id`.
    async fn put(&self, record: &ContactRecord) -> Result<(), AppError>;

    /// Looks a record up by id.
    async fn fetch(&self, id: &str) -> Result<Option<ContactRecord>, AppError>;
}

#[derive(Clone)]
pub struct ContactStore {
    cache: Arc<dyn ContactBackend>,
    durable: Arc<dyn ContactBackend>,
}

impl ContactStore {
    #[must_use]
    pub fn new(cache: Arc<dyn ContactBackend>, durable: Arc<dyn ContactBackend>) -> Self {
        Self { cache, durable }
    }

    /// Stores `fields` verbatim under a fresh id and returns the resulting
    /// record.
    ///
    /// The durable write must succeed; a failed cache write only costs a
    /// later durable lookup.
    #[instrument(skip_all)]
    pub async fn create(&self, fields: ContactFields) -> Result<ContactRecord, AppError> {
        if fields.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }

        let record = ContactRecord::new(Uuid::new_v4().to_string(), fields);
        self.durable.put(&record).await?;
        if let Err(e) = self.cache.put(&record).await {
            warn!(id = %record.id, "Failed to cache contact: {:?}", e);
        }

        Ok(record)
    }

    /// Looks `id` up in the cache, then in the durable tier.
    #[instrument(skip(self))]
    pub async fn find(&self, id: &str) -> Result<Option<ContactRecord>, AppError> {
        if let Some(record) = self.cache.fetch(id).await? {
            return Ok(Some(record));
        }

        let Some(record) = self.durable.fetch(id).await? else {
            return Ok(None);
        };

        if let Err(e) = self.cache.put(&record).await {
            warn!(id = %id, "Failed to repopulate cache: {:?}", e);
        }
        Ok(Some(record))
    }

    /// Like [`find`](Self::find), with a missing record reported as
    /// [`AppError::NotFound`].
    pub async fn get(&self, id: &str) -> Result<ContactRecord, AppError> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contact '{id}' not found")))
    }
}
