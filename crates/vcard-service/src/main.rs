mod app;
mod config;
mod database;
mod public_url;
mod repository;
mod routes;
mod store;
mod tracking;
mod views;

use std::net::SocketAddr;

use tracing::info;
use vcard_core::telemetry;

use app::AppState;
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = telemetry::init_tracing(&config.observability_config(), "vcard-service")?;

    let db_pool = database::connect(&config.database_config()).await?;
    database::ensure_schema(&db_pool).await?;

    let (base_url, _tunnel) = public_url::resolve(&config).await;

    let state = AppState::new(db_pool, config.render_options(), &base_url)?;
    let app = app::router(state);

    let addr = config.server_addr();
    info!(
        "Starting vcard-service on {} (scan links use {})",
        addr, base_url
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
