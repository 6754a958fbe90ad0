//! Resolution of the base URL printed in scan links.
//!
//! Order: an explicit `PUBLIC_BASE_URL`, then the URL announced by an
//! outbound tunnel command, then the local bind address. Tunnel problems
//! only produce a warning.

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("tunnel command is empty")]
    EmptyCommand,

    #[error("failed to start tunnel: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("tunnel did not announce a public URL within {0:?}")]
    Timeout(Duration),

    #[error("tunnel exited without announcing a public URL")]
    Closed,
}

/// Keeps the tunnel process alive; it is killed when this is dropped.
#[derive(Debug)]
pub struct Tunnel {
    _child: Child,
}

/// Picks the public base URL for this process.
#[instrument(skip(config))]
pub async fn resolve(config: &Config) -> (String, Option<Tunnel>) {
    if let Some(explicit) = config.public_base_url.as_deref() {
        let base = explicit.trim_end_matches('/').to_string();
        info!(%base, "Using configured public base URL");
        return (base, None);
    }

    if let Some(command) = config.tunnel_command.as_deref() {
        match open_tunnel(command, config.tunnel_timeout()).await {
            Ok((base, tunnel)) => {
                info!(%base, "Tunnel established");
                return (base, Some(tunnel));
            }
            Err(e) => warn!("Tunnel unavailable, falling back to local URL: {}", e),
        }
    }

    let base = local_base_url(&config.server_host, config.server_port);
    info!(%base, "Using local base URL");
    (base, None)
}

/// Starts `command` and waits for the first `https://` URL it prints on
/// stdout or stderr.
pub async fn open_tunnel(
    command: &str,
    timeout: Duration,
) -> Result<(String, Tunnel), TunnelError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or(TunnelError::EmptyCommand)?;

    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let (tx, mut rx) = mpsc::channel(2);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(watch_output(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(watch_output(stderr, tx));
    }

    match tokio::time::timeout(timeout, rx.recv()).await {
        Ok(Some(url)) => Ok((url, Tunnel { _child: child })),
        Ok(None) => Err(TunnelError::Closed),
        Err(_) => Err(TunnelError::Timeout(timeout)),
    }
}

// Keeps draining after the URL is found so the child never blocks on a full pipe.
async fn watch_output<R>(output: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(output).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(url) = find_url(&line) {
            let _ = tx.try_send(url);
        }
    }
}

fn find_url(line: &str) -> Option<String> {
    line.split_whitespace()
        .filter(|token| token.starts_with("https://"))
        .find_map(|token| url::Url::parse(token).ok())
        .map(|url| url.as_str().trim_end_matches('/').to_string())
}

/// `http://host:port`, with wildcard bind addresses shown as `localhost`.
#[must_use]
pub fn local_base_url(host: &str, port: u16) -> String {
    match host {
        "" | "0.0.0.0" | "::" | "[::]" => format!("http://localhost:{port}"),
        h if h.contains(':') && !h.starts_with('[') => format!("http://[{h}]:{port}"),
        h => format!("http://{h}:{port}"),
    }
}
