//! Request metadata captured for each scan.

use std::fmt;
use std::net::IpAddr;

use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};

const MOBILE_TOKENS: &[&str] = &[
    "Mobile",
    "Android",
    "iPhone",
    "iPod",
    "BlackBerry",
    "IEMobile",
    "Opera Mini",
];
const TABLET_TOKENS: &[&str] = &["Tablet", "iPad", "PlayBook", "Silk"];
const DESKTOP_TOKENS: &[&str] = &["Windows", "Macintosh", "Linux", "X11"];

/// Coarse device category inferred from a user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
    Unknown,
}

impl DeviceClass {
    /// Case-sensitive token match; mobile wins over tablet, tablet over desktop.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        let matches = |tokens: &[&str]| tokens.iter().any(|t| user_agent.contains(t));
        if matches(MOBILE_TOKENS) {
            Self::Mobile
        } else if matches(TABLET_TOKENS) {
            Self::Tablet
        } else if matches(DESKTOP_TOKENS) {
            Self::Desktop
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location a client may report after downloading a card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// What a single request tells us about the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub device_class: DeviceClass,
}

impl ScanMetadata {
    /// Reads the client address, user agent and referer from a request.
    ///
    /// The first `X-Forwarded-For` entry is preferred over `remote`, which is
    /// the address of whoever opened the connection (often a proxy).
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, remote: Option<IpAddr>) -> Self {
        let text = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        let user_agent = text(header::USER_AGENT);
        let device_class = DeviceClass::from_user_agent(user_agent.as_deref().unwrap_or_default());

        Self {
            ip_address: client_ip(headers, remote),
            user_agent,
            referer: text(header::REFERER),
            device_class,
        }
    }
}

fn client_ip(headers: &HeaderMap, remote: Option<IpAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .or_else(|| remote.map(|ip| ip.to_string()))
}
