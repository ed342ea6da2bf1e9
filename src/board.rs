use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{info, warn};
use serde::Serialize;

use crate::error::{DealBoardError, Result};
use crate::models::Deal;
use crate::pipeline::aggregator::{self, ColumnView, StageAnalytics};
use crate::pipeline::drag::{Bounds, DragDropController, Point};
use crate::pipeline::stages::{self, Stage};
use crate::pipeline::summary::{self, CloseOutlook, PipelineSummary};
use crate::store::DealStore;

/// Board snapshot as emitted by the CLI.
///
/// `fetched_deals` counts every record the store returned, including ones in
/// stages the board has no column for; `summary.total_deals` only counts cards.
#[derive(Debug, Serialize)]
pub struct BoardView {
    pub collected_at: DateTime<Utc>,
    pub fetched_deals: usize,
    pub columns: IndexMap<String, BoardColumn>,
    pub summary: PipelineSummary,
}

#[derive(Debug, Serialize)]
pub struct BoardColumn {
    pub name: String,
    pub color: String,
    pub icon: String,
    pub total_value: f64,
    pub analytics: StageAnalytics,
    pub cards: Vec<DealCard>,
}

#[derive(Debug, Serialize)]
pub struct DealCard {
    #[serde(flatten)]
    pub deal: Deal,
    pub close_outlook: Option<CloseOutlook>,
}

/// Pipeline board over an injected record store.
///
/// Keeps the last fetched snapshot and the drag state. Every view is derived
/// from the snapshot on demand.
pub struct Board {
    store: Box<dyn DealStore>,
    deals: Vec<Deal>,
    drag: DragDropController,
}

impl Board {
    pub fn new(store: Box<dyn DealStore>) -> Self {
        Self {
            store,
            deals: Vec::new(),
            drag: DragDropController::new(),
        }
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.deals = self.store.fetch_all().await?;
        info!("Board snapshot holds {} deals", self.deals.len());
        Ok(())
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn columns(&self) -> &'static [Stage] {
        stages::all()
    }

    pub fn column_view(&self, stage_id: &str) -> ColumnView {
        aggregator::column_view(&self.deals, stage_id)
    }

    pub fn drag(&self) -> &DragDropController {
        &self.drag
    }

    pub fn view(&self, now: DateTime<Utc>) -> BoardView {
        let today = now.date_naive();

        let columns = self
            .columns()
            .iter()
            .map(|stage| {
                let view = self.column_view(stage.id);
                let cards = view
                    .deals
                    .into_iter()
                    .map(|deal| DealCard {
                        close_outlook: summary::close_outlook(&deal, today),
                        deal,
                    })
                    .collect();

                (
                    stage.id.to_string(),
                    BoardColumn {
                        name: stage.name.to_string(),
                        color: stage.color.to_string(),
                        icon: stage.icon.to_string(),
                        total_value: view.total_value,
                        analytics: view.analytics,
                        cards,
                    },
                )
            })
            .collect();

        BoardView {
            collected_at: now,
            fetched_deals: self.deals.len(),
            columns,
            summary: summary::calculate_summary(&self.deals),
        }
    }

    pub fn drag_start(&mut self, deal_id: i64) -> Result<()> {
        let deal = self
            .deals
            .iter()
            .find(|d| d.id == deal_id)
            .cloned()
            .ok_or(DealBoardError::NotFound(deal_id))?;

        self.drag.on_drag_start(deal);
        Ok(())
    }

    pub fn drag_enter(&mut self, stage_id: &str) -> bool {
        self.drag.on_drag_enter(stage_id)
    }

    pub fn drag_leave(&mut self, stage_id: &str, pointer: Option<Point>, column: Bounds) -> bool {
        self.drag.on_drag_leave(stage_id, pointer, column)
    }

    pub fn drag_end(&mut self) {
        self.drag.on_drag_end();
    }

    /// Drop the dragged deal on `stage_id`.
    ///
    /// Drag state is cleared before the store is called. Whatever the store
    /// answers, the snapshot is re-fetched so a rejected move snaps back.
    /// Returns the moved deal, or `None` when nothing needed to move.
    pub async fn drop_on(&mut self, stage_id: &str) -> Result<Option<Deal>> {
        let Some(request) = self.drag.on_drop(stage_id) else {
            return Ok(None);
        };

        let outcome = self
            .store
            .update_stage(request.deal_id, &request.new_stage)
            .await;

        match &outcome {
            Ok(_) => info!("Deal {} moved to {}", request.deal_id, request.new_stage),
            Err(e) => warn!(
                "Failed to move deal {} to {}: {e}",
                request.deal_id, request.new_stage
            ),
        }

        if let Err(e) = self.refresh().await {
            warn!("Could not refresh board after drop: {e}");
            outcome?;
            return Err(e);
        }

        outcome.map(Some)
    }
}
