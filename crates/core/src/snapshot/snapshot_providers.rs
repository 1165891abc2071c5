//! Snapshot providers: the remote data endpoint, a local file and an in-memory source.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::errors::{Result, SnapshotError};

use super::{PortfolioSnapshot, SnapshotProvider};

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the snapshot as JSON from the external data provider.
///
/// There is no retry: a failed request surfaces as an error to the caller.
pub struct HttpSnapshotProvider {
    client: Client,
    url: String,
}

impl HttpSnapshotProvider {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SnapshotProvider for HttpSnapshotProvider {
    async fn fetch_snapshot(&self) -> Result<PortfolioSnapshot> {
        debug!("Fetching portfolio snapshot from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SnapshotError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SnapshotError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| SnapshotError::Fetch(e.to_string()))?;

        let snapshot = PortfolioSnapshot::from_json(&body)?;
        debug!(
            "Loaded snapshot with {} portfolios",
            snapshot.portfolios.len()
        );
        Ok(snapshot)
    }
}

/// Reads the snapshot from a JSON file on every fetch.
pub struct FileSnapshotProvider {
    path: PathBuf,
}

impl FileSnapshotProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SnapshotProvider for FileSnapshotProvider {
    async fn fetch_snapshot(&self) -> Result<PortfolioSnapshot> {
        debug!("Reading portfolio snapshot from {}", self.path.display());
        let raw = tokio::fs::read_to_string(&self.path).await?;
        PortfolioSnapshot::from_json(&raw)
    }
}

/// Serves a snapshot that is already in memory.
pub struct StaticSnapshotProvider {
    snapshot: PortfolioSnapshot,
}

impl StaticSnapshotProvider {
    pub fn new(snapshot: PortfolioSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SnapshotProvider for StaticSnapshotProvider {
    async fn fetch_snapshot(&self) -> Result<PortfolioSnapshot> {
        Ok(self.snapshot.clone())
    }
}
