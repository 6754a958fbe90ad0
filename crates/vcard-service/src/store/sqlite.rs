use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;
use vcard_core::{AppError, ContactFields, ContactRecord};

use super::ContactBackend;

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: String,
    name: String,
    company: Option<String>,
    title: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    website: Option<String>,
}

impl From<ContactRow> for ContactRecord {
    fn from(row: ContactRow) -> Self {
        ContactRecord::new(
            row.id,
            ContactFields {
                name: row.name,
                company: row.company,
                title: row.title,
                email: row.email,
                phone: row.phone,
                website: row.website,
            },
        )
    }
}

/// Durable tier: raw fields in the `contacts` table. Card text is not
/// stored; it is rebuilt from the fields on every read.
#[derive(Clone)]
pub struct SqliteContacts {
    pool: SqlitePool,
}

impl SqliteContacts {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactBackend for SqliteContacts {
    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn put(&self, record: &ContactRecord) -> Result<(), AppError> {
        let fields = &record.fields;
        sqlx::query(
            r"
            INSERT INTO contacts (id, name, company, title, email, phone, website)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                company = excluded.company,
                title = excluded.title,
                email = excluded.email,
                phone = excluded.phone,
                website = excluded.website,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            ",
        )
        .bind(&record.id)
        .bind(&fields.name)
        .bind(&fields.company)
        .bind(&fields.title)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.website)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch(&self, id: &str) -> Result<Option<ContactRecord>, AppError> {
        let row = sqlx::query_as::<_, ContactRow>(
            r"
            SELECT id, name, company, title, email, phone, website
            FROM contacts
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(ContactRecord::from))
    }
}
