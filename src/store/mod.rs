pub mod mock;
pub mod remote;

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::Deal;

/// Source of truth for deal records.
#[async_trait]
pub trait DealStore: Send + Sync {
    /// Current snapshot, in the store's own order.
    async fn fetch_all(&self) -> Result<Vec<Deal>>;

    /// Move one deal to `new_stage` and return the stored record.
    async fn update_stage(&self, deal_id: i64, new_stage: &str) -> Result<Deal>;
}

pub async fn connect(config: StoreConfig) -> Result<Box<dyn DealStore>> {
    match config {
        StoreConfig::Mock { path } => Ok(Box::new(mock::MockStore::open(path).await?)),
        StoreConfig::Remote {
            base_url,
            project_id,
            public_key,
        } => Ok(Box::new(remote::RemoteStore::new(
            &base_url, project_id, public_key,
        )?)),
    }
}
