//! Shared request state and the HTTP router.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use vcard_core::{AppError, RenderOptions};

use crate::repository::ScanRepository;
use crate::routes;
use crate::store::{ContactStore, MemoryContacts, SqliteContacts};
use crate::tracking::ScanLogger;
use crate::views::Views;

#[derive(Clone)]
pub struct AppState {
    pub contacts: ContactStore,
    pub logger: ScanLogger,
    pub views: Views,
    pub render_options: RenderOptions,
    /// Prefix of the scan links, without a trailing slash.
    pub base_url: Arc<str>,
}

impl AppState {
    /// Wires the cache and SQLite tiers over `pool`.
    pub fn new(
        pool: SqlitePool,
        render_options: RenderOptions,
        base_url: &str,
    ) -> Result<Self, AppError> {
        let contacts = ContactStore::new(
            Arc::new(MemoryContacts::default()),
            Arc::new(SqliteContacts::new(pool.clone())),
        );
        Ok(Self::with_store(
            contacts,
            pool,
            Views::new()?,
            render_options,
            base_url,
        ))
    }

    #[must_use]
    pub fn with_store(
        contacts: ContactStore,
        pool: SqlitePool,
        views: Views,
        render_options: RenderOptions,
        base_url: &str,
    ) -> Self {
        let logger = ScanLogger::new(contacts.clone(), ScanRepository::new(pool));
        Self {
            contacts,
            logger,
            views,
            render_options,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/ready", get(routes::ready))
        .route("/", get(routes::form))
        .route("/generate", post(routes::generate))
        .route("/scan/{id}", get(routes::scan))
        .route("/vcard/{id}", get(routes::vcard))
        .route("/qr/{file}", get(routes::qr_code))
        .route("/track/{id}", post(routes::track))
        .route("/analytics", get(routes::global_analytics))
        .route("/analytics/{id}", get(routes::contact_analytics))
        .route("/analytics/{id}/export", get(routes::export_scans))
        .route("/dashboard", get(routes::dashboard))
        .route("/dashboard/{id}", get(routes::contact_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        body::Body,
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;
    use vcard_core::{ContactFields, ContactRecord, card};

    use super::*;
    use crate::database::memory_pool;

    const IPHONE: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";

    struct Harness {
        app: Router,
        state: AppState,
        cache: Arc<MemoryContacts>,
        pool: SqlitePool,
    }

    impl Harness {
        async fn new() -> Self {
            let pool = memory_pool().await;
            let cache = Arc::new(MemoryContacts::default());
            let contacts = ContactStore::new(
                cache.clone(),
                Arc::new(SqliteContacts::new(pool.clone())),
            );
            let state = AppState::with_store(
                contacts,
                pool.clone(),
                Views::new().unwrap(),
                RenderOptions::default(),
                "https://cards.example/",
            );
            let app = router(state.clone())
                .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 7], 40000))));
            Self {
                app,
                state,
                cache,
                pool,
            }
        }

        async fn contact(&self, name: &str) -> ContactRecord {
            self.state
                .contacts
                .create(ContactFields {
                    name: name.to_string(),
                    company: Some("Acme Corp".into()),
                    phone: Some("(555) 123-4567".into()),
                    ..ContactFields::default()
                })
                .await
                .unwrap()
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.app.clone().oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn scan_count(&self) -> i64 {
            sqlx::query_scalar("SELECT COUNT(*) FROM scans")
                .fetch_one(&self.pool)
                .await
                .unwrap()
        }
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    async fn body_text(response: Response) -> String {
        String::from_utf8(body_bytes(response).await).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn header_value(response: &Response, name: header::HeaderName) -> String {
        response.headers()[name].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn probes_report_ok() {
        let h = Harness::new().await;

        let health = h.get("/health").await;
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(body_json(health).await["service_name"], "vcard-service");

        let ready = h.get("/ready").await;
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(body_json(ready).await["database"], "ok");
    }

    #[tokio::test]
    async fn form_page_is_served() {
        let h = Harness::new().await;
        let response = h.get("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("action=\"/generate\""));
    }

    #[tokio::test]
    async fn generate_stores_contact_and_lists_downloads() {
        let h = Harness::new().await;
        let request = Request::post("/generate")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "name=Jane+Doe&company=Acme&title=&email=jane%40acme.example&phone=&website=acme.example&qr_mode=vcard",
            ))
            .unwrap();

        let response = h.send(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        let id: String = sqlx::query_scalar("SELECT id FROM contacts")
            .fetch_one(&h.pool)
            .await
            .unwrap();
        assert!(html.contains("QR Code Generated Successfully!"));
        assert!(html.contains("jane-doe.vcf"));
        assert!(html.contains("<svg"));
        for ext in ["png", "svg", "eps", "pdf"] {
            let link = format!("href=\"/qr/{id}.{ext}\"");
            assert!(html.contains(&link), "{ext} link missing");
        }

        let stored = h.state.contacts.get(&id).await.unwrap();
        assert_eq!(stored.fields.title, None);
        assert_eq!(stored.fields.website.as_deref(), Some("acme.example"));
        assert!(stored.card_text.contains("URL:https://acme.example"));
    }

    #[tokio::test]
    async fn generate_rejects_blank_names() {
        let h = Harness::new().await;
        let request = Request::post("/generate")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=+++"))
            .unwrap();

        let response = h.send(request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scan_downloads_card_and_logs_once() {
        let h = Harness::new().await;
        let contact = h.contact("Jane Doe").await;

        let request = Request::get(format!("/scan/{}", contact.id))
            .header(header::USER_AGENT, IPHONE)
            .body(Body::empty())
            .unwrap();
        let response = h.send(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_value(&response, header::CONTENT_TYPE), "text/vcard");
        assert_eq!(
            header_value(&response, header::CONTENT_DISPOSITION),
            "attachment; filename=\"jane-doe.vcf\""
        );
        let expected = card::format_card(&contact.fields);
        assert_eq!(body_text(response).await, expected);

        let (ip, device): (Option<String>, String) =
            sqlx::query_as("SELECT ip_address, device_type FROM scans")
                .fetch_one(&h.pool)
                .await
                .unwrap();
        assert_eq!(ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(device, "mobile");
    }

    #[tokio::test]
    async fn scan_survives_cache_loss() {
        let h = Harness::new().await;
        let contact = h.contact("Jane Doe").await;
        h.cache.clear().await;

        let response = h.get(&format!("/scan/{}", contact.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, contact.card_text);
        assert_eq!(h.scan_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found_everywhere() {
        let h = Harness::new().await;

        for uri in [
            "/scan/missing",
            "/vcard/missing",
            "/qr/missing.png",
            "/analytics/missing",
            "/analytics/missing/export",
            "/dashboard/missing",
        ] {
            assert_eq!(h.get(uri).await.status(), StatusCode::NOT_FOUND, "{uri}");
        }
        assert_eq!(h.scan_count().await, 0);
    }

    #[tokio::test]
    async fn vcard_download_is_not_logged() {
        let h = Harness::new().await;
        let contact = h.contact("Jane Doe").await;

        let response = h.get(&format!("/vcard/{}", contact.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, contact.card_text);
        assert_eq!(h.scan_count().await, 0);
    }

    #[tokio::test]
    async fn qr_codes_download_in_each_format() {
        let h = Harness::new().await;
        let contact = h.contact("Jane Doe").await;

        for (ext, content_type) in [
            ("png", "image/png"),
            ("svg", "image/svg+xml"),
            ("eps", "application/postscript"),
            ("pdf", "application/pdf"),
        ] {
            let response = h.get(&format!("/qr/{}.{ext}", contact.id)).await;
            assert_eq!(response.status(), StatusCode::OK, "{ext}");
            assert_eq!(header_value(&response, header::CONTENT_TYPE), content_type);
            assert_eq!(
                header_value(&response, header::CONTENT_DISPOSITION),
                format!("attachment; filename=\"qr_jane-doe.{ext}\"")
            );
            assert!(!body_bytes(response).await.is_empty());
        }

        let unsupported = h.get(&format!("/qr/{}.gif", contact.id)).await;
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);
        let bare = h.get(&format!("/qr/{}", contact.id)).await;
        assert_eq!(bare.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn track_records_location_and_tolerates_bad_bodies() {
        let h = Harness::new().await;
        let contact = h.contact("Jane Doe").await;
        let uri = format!("/track/{}", contact.id);

        let with_location = Request::post(&uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"location":{"country":"NL","city":"Utrecht","latitude":52.09,"longitude":5.12}}"#,
            ))
            .unwrap();
        let response = h.send(with_location).await;
        assert_eq!(response.status(), StatusCode::OK);
        let ack = body_json(response).await;
        assert_eq!(ack["success"], true);
        assert_eq!(ack["message"], "Scan tracked successfully");

        let garbage = Request::post(&uri).body(Body::from("{oops")).unwrap();
        assert_eq!(h.send(garbage).await.status(), StatusCode::OK);

        let rows: Vec<(Option<String>, Option<f64>)> =
            sqlx::query_as("SELECT country, latitude FROM scans ORDER BY id")
                .fetch_all(&h.pool)
                .await
                .unwrap();
        assert_eq!(
            rows,
            vec![(Some("NL".to_string()), Some(52.09)), (None, None)]
        );

        let unknown = Request::post("/track/missing").body(Body::empty()).unwrap();
        assert_eq!(h.send(unknown).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(h.scan_count().await, 2);
    }

    #[tokio::test]
    async fn analytics_report_scoped_and_global_numbers() {
        let h = Harness::new().await;
        let jane = h.contact("Jane Doe").await;
        let john = h.contact("John Roe").await;
        for _ in 0..2 {
            h.get(&format!("/scan/{}", jane.id)).await;
        }

        let scoped = body_json(h.get(&format!("/analytics/{}", jane.id)).await).await;
        assert_eq!(scoped["name"], "Jane Doe");
        assert_eq!(scoped["total_scans"], 2);
        assert_eq!(scoped["unique_visitors"], 1);

        let empty = body_json(h.get(&format!("/analytics/{}", john.id)).await).await;
        assert_eq!(empty["total_scans"], 0);
        assert_eq!(empty["recent_scans"], Value::Array(vec![]));

        let global = body_json(h.get("/analytics").await).await;
        assert_eq!(global["total_scans"], 2);
        assert_eq!(global["top_contacts"][0]["id"], jane.id.as_str());
        assert_eq!(global["top_contacts"][1]["scan_count"], 0);
    }

    #[tokio::test]
    async fn export_is_a_named_csv_attachment() {
        let h = Harness::new().await;
        let contact = h.contact("Jane Doe").await;
        h.get(&format!("/scan/{}", contact.id)).await;

        let response = h.get(&format!("/analytics/{}/export", contact.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = header_value(&response, header::CONTENT_DISPOSITION);
        assert!(
            disposition.starts_with("attachment; filename=\"analytics_jane-doe_")
        );
        assert!(disposition.ends_with(".csv\""));
        let csv = body_text(response).await;
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.starts_with("scan_id,scanned_at,device_type"));
    }

    #[tokio::test]
    async fn broken_scan_table_degrades_to_empty_numbers() {
        let h = Harness::new().await;
        let contact = h.contact("Jane Doe").await;
        sqlx::query("DROP TABLE scans")
            .execute(&h.pool)
            .await
            .unwrap();

        let global = h.get("/analytics").await;
        assert_eq!(global.status(), StatusCode::OK);
        let global = body_json(global).await;
        assert_eq!(global["total_scans"], 0);
        assert_eq!(global["top_contacts"], Value::Array(vec![]));

        let scoped = h.get(&format!("/analytics/{}", contact.id)).await;
        assert_eq!(scoped.status(), StatusCode::OK);
        assert_eq!(body_json(scoped).await["total_scans"], 0);

        let dashboard = h.get("/dashboard").await;
        assert_eq!(dashboard.status(), StatusCode::OK);
        assert!(body_text(dashboard).await.contains("No scans yet"));

        let scan = h.get(&format!("/scan/{}", contact.id)).await;
        assert_eq!(scan.status(), StatusCode::OK);
        assert_eq!(body_text(scan).await, contact.card_text);
    }

    #[tokio::test]
    async fn dashboards_render() {
        let h = Harness::new().await;
        let contact = h.contact("Jane Doe").await;
        h.get(&format!("/scan/{}", contact.id)).await;

        let global = body_text(h.get("/dashboard").await).await;
        assert!(global.contains("All contacts"));
        assert!(global.contains("Jane Doe"));

        let scoped = body_text(h.get(&format!("/dashboard/{}", contact.id)).await).await;
        assert!(scoped.contains("Jane Doe"));
        assert!(scoped.contains("Export scans as CSV"));
    }
}
