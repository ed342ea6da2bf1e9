use log::{debug, warn};
use serde::Serialize;

use super::stages;
use crate::models::Deal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Screen rectangle occupied by a board column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Stage change requested by a drop gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRequest {
    pub deal_id: i64,
    pub new_stage: String,
}

/// Drag state of the pipeline board.
///
/// Holds at most one dragged deal plus the column it is hovering. Every
/// gesture is handled synchronously; a drop hands back the move to perform and
/// the controller is idle again before that move is even attempted.
#[derive(Debug, Default)]
pub struct DragDropController {
    dragged_deal: Option<Deal>,
    dragged_over_stage: Option<&'static str>,
}

impl DragDropController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragged_deal(&self) -> Option<&Deal> {
        self.dragged_deal.as_ref()
    }

    pub fn dragged_over_stage(&self) -> Option<&'static str> {
        self.dragged_over_stage
    }

    pub fn is_idle(&self) -> bool {
        self.dragged_deal.is_none()
    }

    /// Whether the card for `deal_id` is the one being dragged.
    pub fn is_dragging(&self, deal_id: i64) -> bool {
        self.dragged_deal.as_ref().is_some_and(|d| d.id == deal_id)
    }

    /// Whether the column for `stage_id` should be highlighted as a target.
    pub fn is_drop_target(&self, stage_id: &str) -> bool {
        self.dragged_over_stage == Some(stage_id)
    }

    /// Starting a new drag supersedes whatever gesture was in progress.
    pub fn on_drag_start(&mut self, deal: Deal) {
        debug!("Drag started for deal {}", deal.id);
        self.dragged_deal = Some(deal);
        self.dragged_over_stage = None;
    }

    /// Returns true when the hovered column actually changed.
    pub fn on_drag_enter(&mut self, stage_id: &str) -> bool {
        if self.is_idle() {
            return false;
        }

        let Some(stage) = stages::find(stage_id) else {
            return false;
        };

        if self.dragged_over_stage == Some(stage.id) {
            return false;
        }

        self.dragged_over_stage = Some(stage.id);
        true
    }

    /// Handle the pointer leaving the column for `stage_id`.
    ///
    /// `pointer` is where the pointer went, or `None` when it left the board
    /// entirely. Moving onto a card nested inside the column keeps the
    /// highlight. Returns true when the hover was cleared.
    pub fn on_drag_leave(
        &mut self,
        stage_id: &str,
        pointer: Option<Point>,
        column: Bounds,
    ) -> bool {
        if pointer.is_some_and(|p| column.contains(p)) {
            return false;
        }

        if self.dragged_over_stage != Some(stage_id) {
            return false;
        }

        self.dragged_over_stage = None;
        true
    }

    /// Finish the gesture over `stage_id`.
    ///
    /// Always returns the controller to idle. Yields a move only when a deal
    /// was being dragged onto a known stage other than its own.
    pub fn on_drop(&mut self, stage_id: &str) -> Option<MoveRequest> {
        let dragged = self.reset();
        let deal = dragged?;

        if !stages::is_known(stage_id) {
            warn!("Ignoring drop of deal {} on unknown stage {stage_id:?}", deal.id);
            return None;
        }

        if deal.stage == stage_id {
            debug!("Deal {} dropped on its own stage {stage_id}", deal.id);
            return None;
        }

        debug!("Deal {} dropped on {stage_id} (from {})", deal.id, deal.stage);
        Some(MoveRequest {
            deal_id: deal.id,
            new_stage: stage_id.to_string(),
        })
    }

    /// Cancelled gesture: nothing moves.
    pub fn on_drag_end(&mut self) {
        self.reset();
    }

    fn reset(&mut self) -> Option<Deal> {
        self.dragged_over_stage = None;
        self.dragged_deal.take()
    }
}
