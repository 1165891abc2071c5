use async_trait::async_trait;

use crate::Result;

use super::PortfolioSnapshot;

/// Source of portfolio snapshots.
///
/// Implementations either return a fully parsed snapshot or an error; a
/// partially populated snapshot is never returned.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<PortfolioSnapshot>;
}
