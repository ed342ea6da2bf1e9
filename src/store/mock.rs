use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use tokio::sync::Mutex;

use super::DealStore;
use crate::error::{DealBoardError, Result};
use crate::models::Deal;
use crate::pipeline::stages;

const SEED_DEALS: &str = include_str!("../../data/deals.json");

/// File-backed store for working without the record service.
///
/// The whole collection is rewritten on every mutation.
pub struct MockStore {
    path: PathBuf,
    deals: Mutex<Vec<Deal>>,
}

impl MockStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let deals = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No deal file at {}, seeding sample deals", path.display());
                let deals: Vec<Deal> = serde_json::from_str(SEED_DEALS)?;
                persist(&path, &deals).await?;
                deals
            }
            Err(e) => return Err(e.into()),
        };

        info!("Loaded {} deals from {}", deals.len(), path.display());

        Ok(Self {
            path,
            deals: Mutex::new(deals),
        })
    }
}

async fn persist(path: &Path, deals: &[Deal]) -> Result<()> {
    let json = serde_json::to_string_pretty(deals)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[async_trait]
impl DealStore for MockStore {
    async fn fetch_all(&self) -> Result<Vec<Deal>> {
        Ok(self.deals.lock().await.clone())
    }

    async fn update_stage(&self, deal_id: i64, new_stage: &str) -> Result<Deal> {
        if !stages::is_known(new_stage) {
            return Err(DealBoardError::Api(format!("Unknown stage: {new_stage}")));
        }

        let mut deals = self.deals.lock().await;
        let mut next = deals.clone();
        let deal = next
            .iter_mut()
            .find(|d| d.id == deal_id)
            .ok_or(DealBoardError::NotFound(deal_id))?;

        deal.set_stage(new_stage, Utc::now());
        let updated = deal.clone();

        // The in-memory collection only changes once the file write succeeded.
        persist(&self.path, &next).await?;
        *deals = next;
        info!("Moved deal {deal_id} to {new_stage}");

        Ok(updated)
    }
}
