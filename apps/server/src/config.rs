use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use rebalancer_core::capacity::IpfConfig;
use rebalancer_core::utils::parse_decimal;

/// Where the server loads its portfolio snapshot from.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotSource {
    Url(String),
    Path(PathBuf),
    /// No provider configured; only requests carrying their own snapshot work.
    None,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub snapshot_source: SnapshotSource,
    pub ipf: IpfConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("RB_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid RB_LISTEN_ADDR")?;
        let cors_allow = std::env::var("RB_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("RB_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);

        let snapshot_source = match (
            non_empty_var("RB_SNAPSHOT_URL"),
            non_empty_var("RB_SNAPSHOT_PATH"),
        ) {
            (Some(url), _) => SnapshotSource::Url(url),
            (None, Some(path)) => SnapshotSource::Path(PathBuf::from(path)),
            (None, None) => SnapshotSource::None,
        };

        let defaults = IpfConfig::default();
        let max_iterations = std::env::var("RB_IPF_MAX_ITERATIONS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_iterations);
        let tolerance = std::env::var("RB_IPF_TOLERANCE")
            .ok()
            .and_then(|v| parse_decimal(&v))
            .filter(|v| v.is_sign_positive() && !v.is_zero())
            .unwrap_or(defaults.tolerance);

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            snapshot_source,
            ipf: IpfConfig {
                max_iterations,
                tolerance,
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
