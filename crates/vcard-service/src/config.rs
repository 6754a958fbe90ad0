//! Configuration for vcard-service.
//!
//! Values come from the process environment (after `.env` is loaded), one
//! variable per field named after the field in upper case, e.g.
//! `SERVER_PORT=9000`. Unset variables keep their defaults.

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use vcard_core::{RenderOptions, qr};
use vcard_core::config::{DatabaseConfig, ObservabilityConfig};

const KEYS: &[&str] = &[
    "database_url",
    "database_max_connections",
    "server_host",
    "server_port",
    "public_base_url",
    "tunnel_command",
    "tunnel_timeout_secs",
    "qr_scale",
    "qr_border",
    "otel_exporter_endpoint",
];

/// Configuration for vcard-service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database connection URL.
    pub database_url: String,

    /// Maximum number of database connections.
    pub database_max_connections: u32,

    /// Server host address.
    pub server_host: String,

    /// Server port.
    pub server_port: u16,

    /// Externally reachable base URL for scan links.
    pub public_base_url: Option<String>,

    /// Command that opens an outbound tunnel and prints its public URL.
    pub tunnel_command: Option<String>,

    /// How long to wait for the tunnel URL.
    pub tunnel_timeout_secs: u64,

    /// Pixels per QR module.
    pub qr_scale: u32,

    /// QR quiet zone in modules.
    pub qr_border: u32,

    /// OTEL exporter endpoint (optional).
    pub otel_exporter_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            database_url: "sqlite://vcard_scans.db".to_string(),
            database_max_connections: 5,
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            public_base_url: None,
            tunnel_command: None,
            tunnel_timeout_secs: 15,
            qr_scale: render.scale,
            qr_border: render.border,
            otel_exporter_endpoint: None,
        }
    }
}

impl Config {
    /// Loads the configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::load_from(Figment::new().merge(Env::raw().only(KEYS)))
    }

    /// Loads the configuration from `overrides` layered over the defaults.
    pub fn load_from(overrides: Figment) -> anyhow::Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(overrides)
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=qr::MAX_SCALE).contains(&self.qr_scale),
            "QR_SCALE must be between 1 and {}",
            qr::MAX_SCALE
        );
        anyhow::ensure!(
            self.qr_border <= qr::MAX_BORDER,
            "QR_BORDER must be at most {}",
            qr::MAX_BORDER
        );
        anyhow::ensure!(
            self.database_max_connections > 0,
            "DATABASE_MAX_CONNECTIONS must be greater than 0"
        );
        Ok(())
    }

    /// Returns the database configuration.
    #[must_use]
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.database_max_connections,
        }
    }

    /// Returns the observability configuration.
    #[must_use]
    pub fn observability_config(&self) -> ObservabilityConfig {
        ObservabilityConfig {
            otlp_endpoint: self.otel_exporter_endpoint.clone(),
        }
    }

    /// Returns the QR rendering parameters.
    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            scale: self.qr_scale,
            border: self.qr_border,
        }
    }

    #[must_use]
    pub fn tunnel_timeout(&self) -> Duration {
        Duration::from_secs(self.tunnel_timeout_secs)
    }

    /// Returns the server address.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
