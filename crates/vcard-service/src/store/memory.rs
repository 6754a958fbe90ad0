use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vcard_core::{AppError, ContactRecord};

use super::ContactBackend;

/// Process-local cache tier; emptied on restart.
#[derive(Default)]
pub struct MemoryContacts {
    records: RwLock<HashMap<String, ContactRecord>>,
}

#[cfg(test)]
impl MemoryContacts {
    /// Drops the cached copy of `id`, if any.
    pub async fn evict(&self, id: &str) {
        self.records.write().await.remove(id);
    }

    /// Drops every cached record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl ContactBackend for MemoryContacts {
    async fn put(&self, record: &ContactRecord) -> Result<(), AppError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<ContactRecord>, AppError> {
        Ok(self.records.read().await.get(id).cloned())
    }
}
