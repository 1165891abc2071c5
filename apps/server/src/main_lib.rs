use std::sync::Arc;

use rebalancer_core::{
    capacity::IpfConfig,
    snapshot::{FileSnapshotProvider, HttpSnapshotProvider, PortfolioSnapshot, SnapshotProvider},
    Allocator,
};
use tokio::sync::RwLock;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    config::{Config, SnapshotSource},
    error::{ApiError, ApiResult},
};

pub struct AppState {
    /// `None` when neither a snapshot URL nor a snapshot file is configured.
    pub snapshot_provider: Option<Arc<dyn SnapshotProvider>>,
    pub ipf_config: IpfConfig,
    /// Server-held controller, loaded from the provider on first use.
    pub allocator: RwLock<Option<Allocator>>,
}

impl AppState {
    pub fn new(snapshot_provider: Option<Arc<dyn SnapshotProvider>>, ipf_config: IpfConfig) -> Self {
        Self {
            snapshot_provider,
            ipf_config,
            allocator: RwLock::new(None),
        }
    }

    pub async fn fetch_snapshot(&self) -> ApiResult<PortfolioSnapshot> {
        let provider = self.snapshot_provider.as_ref().ok_or_else(|| {
            ApiError::ServiceUnavailable("No snapshot provider configured".to_string())
        })?;
        let snapshot = provider.fetch_snapshot().await?;
        tracing::info!("Fetched snapshot with {} portfolios", snapshot.portfolios.len());
        Ok(snapshot)
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("RB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let snapshot_provider: Option<Arc<dyn SnapshotProvider>> = match &config.snapshot_source {
        SnapshotSource::Url(url) => {
            tracing::info!("Snapshot provider: {}", url);
            Some(Arc::new(HttpSnapshotProvider::new(url.clone())))
        }
        SnapshotSource::Path(path) => {
            tracing::info!("Snapshot file: {}", path.display());
            Some(Arc::new(FileSnapshotProvider::new(path)))
        }
        SnapshotSource::None => {
            tracing::warn!(
                "No RB_SNAPSHOT_URL or RB_SNAPSHOT_PATH set; only inline snapshots are accepted"
            );
            None
        }
    };

    tracing::info!(
        "IPF limits: {} iterations, tolerance {}",
        config.ipf.max_iterations,
        config.ipf.tolerance
    );

    Ok(Arc::new(AppState::new(snapshot_provider, config.ipf)))
}
