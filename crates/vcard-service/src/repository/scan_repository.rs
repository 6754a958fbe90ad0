use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::instrument;
use vcard_core::{AppError, Location, ScanMetadata};

const RECENT_LIMIT: i64 = 10;
const TOP_CONTACTS_LIMIT: i64 = 10;

/// Rollup over every scan, or over the scans of one contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanStats {
    pub total_scans: i64,
    pub unique_visitors: i64,
    pub mobile_scans: i64,
    pub desktop_scans: i64,
    pub tablet_scans: i64,
    pub first_scan: Option<DateTime<Utc>>,
    pub last_scan: Option<DateTime<Utc>>,
    pub recent_scans: Vec<RecentScan>,
    pub daily_scans: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RecentScan {
    pub contact_id: String,
    pub scanned_at: DateTime<Utc>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_class: String,
    pub ip_address: Option<String>,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TopContact {
    pub id: String,
    pub name: String,
    pub scan_count: i64,
}

/// A full scan row, as exported.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ScanRecord {
    pub id: i64,
    pub scanned_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_class: String,
    pub referer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub action: String,
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    total_scans: i64,
    unique_visitors: i64,
    mobile_scans: i64,
    desktop_scans: i64,
    tablet_scans: i64,
    first_scan: Option<DateTime<Utc>>,
    last_scan: Option<DateTime<Utc>>,
}

/// Append-only access to the `scans` table plus the rollups over it.
///
/// Queries taking `Option<&str>` cover every contact when given `None`.
#[derive(Clone)]
pub struct ScanRepository {
    pool: SqlitePool,
}

impl ScanRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Appends one scan; the store assigns id and timestamp.
    #[instrument(skip(self, meta, location))]
    pub async fn insert(
        &self,
        contact_id: &str,
        meta: &ScanMetadata,
        location: Option<&Location>,
        action: &str,
    ) -> Result<i64, AppError> {
        let location = location.cloned().unwrap_or_default();

        let (id,) = sqlx::query_as::<_, (i64,)>(
            r"
            INSERT INTO scans (
                contact_id, ip_address, user_agent, device_type, referer,
                country, city, latitude, longitude, action
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(contact_id)
        .bind(&meta.ip_address)
        .bind(&meta.user_agent)
        .bind(meta.device_class.as_str())
        .bind(&meta.referer)
        .bind(&location.country)
        .bind(&location.city)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(action)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(id)
    }

    /// Counts, device breakdown, first/last scan, the ten latest scans and
    /// per-day counts for the last seven days. No matching scans yields the
    /// zeroed default rather than an error.
    #[instrument(skip(self))]
    pub async fn stats(&self, contact_id: Option<&str>) -> Result<ScanStats, AppError> {
        let totals = sqlx::query_as::<_, TotalsRow>(
            r"
            SELECT
                COUNT(*) AS total_scans,
                COUNT(DISTINCT ip_address) AS unique_visitors,
                COUNT(CASE WHEN device_type = 'mobile' THEN 1 END) AS mobile_scans,
                COUNT(CASE WHEN device_type = 'desktop' THEN 1 END) AS desktop_scans,
                COUNT(CASE WHEN device_type = 'tablet' THEN 1 END) AS tablet_scans,
                MIN(scan_time) AS first_scan,
                MAX(scan_time) AS last_scan
            FROM scans
            WHERE ?1 IS NULL OR contact_id = ?1
            ",
        )
        .bind(contact_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let recent_scans = sqlx::query_as::<_, RecentScan>(
            r"
            SELECT
                contact_id,
                scan_time AS scanned_at,
                country,
                city,
                device_type AS device_class,
                ip_address,
                action
            FROM scans
            WHERE ?1 IS NULL OR contact_id = ?1
            ORDER BY scan_time DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(contact_id)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let daily_scans = sqlx::query_as::<_, DailyCount>(
            r"
            SELECT substr(scan_time, 1, 10) AS date, COUNT(*) AS count
            FROM scans
            WHERE (?1 IS NULL OR contact_id = ?1)
              AND scan_time >= strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '-7 days')
            GROUP BY date
            ORDER BY date DESC
            ",
        )
        .bind(contact_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ScanStats {
            total_scans: totals.total_scans,
            unique_visitors: totals.unique_visitors,
            mobile_scans: totals.mobile_scans,
            desktop_scans: totals.desktop_scans,
            tablet_scans: totals.tablet_scans,
            first_scan: totals.first_scan,
            last_scan: totals.last_scan,
            recent_scans,
            daily_scans,
        })
    }

    /// Contacts ordered by scan count, including contacts never scanned.
    #[instrument(skip(self))]
    pub async fn top_contacts(&self) -> Result<Vec<TopContact>, AppError> {
        sqlx::query_as::<_, TopContact>(
            r"
            SELECT c.id, c.name, COUNT(s.id) AS scan_count
            FROM contacts c
            LEFT JOIN scans s ON s.contact_id = c.id
            GROUP BY c.id, c.name
            ORDER BY scan_count DESC, c.created_at DESC
            LIMIT ?
            ",
        )
        .bind(TOP_CONTACTS_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every scan of `contact_id`, newest first.
    #[instrument(skip(self))]
    pub async fn export(&self, contact_id: &str) -> Result<Vec<ScanRecord>, AppError> {
        sqlx::query_as::<_, ScanRecord>(
            r"
            SELECT
                id,
                scan_time AS scanned_at,
                ip_address,
                user_agent,
                device_type AS device_class,
                referer,
                country,
                city,
                latitude,
                longitude,
                action
            FROM scans
            WHERE contact_id = ?
            ORDER BY scan_time DESC, id DESC
            ",
        )
        .bind(contact_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }
}
