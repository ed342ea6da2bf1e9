use serde::Serialize;

use super::stages;
use crate::models::Deal;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    Fast,
    Normal,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageAnalytics {
    pub avg_days: i64,
    pub performance: Performance,
    pub deal_count: usize,
}

impl StageAnalytics {
    fn empty() -> Self {
        Self {
            avg_days: 0,
            performance: Performance::Normal,
            deal_count: 0,
        }
    }
}

/// Everything a board column needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    pub deals: Vec<Deal>,
    pub total_value: f64,
    pub analytics: StageAnalytics,
}

struct Thresholds {
    fast_max: i64,
    slow_min: i64,
}

fn thresholds(stage_id: &str) -> Option<Thresholds> {
    let (fast_max, slow_min) = match stage_id {
        "Lead" => (3, 14),
        "Qualified" => (7, 21),
        "Proposal" => (14, 30),
        "Negotiation" => (10, 28),
        "Closed Won" => (30, 60),
        _ => return None,
    };

    Some(Thresholds { fast_max, slow_min })
}

/// Deals currently in `stage_id`, in input order.
pub fn deals_in_stage<'a>(deals: &'a [Deal], stage_id: &str) -> Vec<&'a Deal> {
    if !stages::is_known(stage_id) {
        return vec![];
    }

    deals.iter().filter(|d| d.stage == stage_id).collect()
}

pub fn total_value(deals: &[Deal], stage_id: &str) -> f64 {
    deals_in_stage(deals, stage_id)
        .iter()
        .map(|d| d.value.value())
        .sum()
}

/// Whole days between creation and the last move, never less than one.
pub fn elapsed_days(deal: &Deal) -> i64 {
    let (Some(created), Some(status)) = (deal.created_at, deal.status_timestamp()) else {
        return 1;
    };

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let days = ((status - created).num_milliseconds() as f64 / MILLIS_PER_DAY).ceil() as i64;
    days.max(1)
}

pub fn stage_analytics(deals: &[Deal], stage_id: &str) -> StageAnalytics {
    let in_stage = deals_in_stage(deals, stage_id);
    if in_stage.is_empty() {
        return StageAnalytics::empty();
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = in_stage.iter().map(|d| elapsed_days(d) as f64).sum::<f64>() / in_stage.len() as f64;

    #[allow(clippy::cast_possible_truncation)]
    let avg_days = mean.round() as i64;

    StageAnalytics {
        avg_days,
        performance: classify(stage_id, avg_days),
        deal_count: in_stage.len(),
    }
}

fn classify(stage_id: &str, avg_days: i64) -> Performance {
    match thresholds(stage_id) {
        Some(t) if avg_days <= t.fast_max => Performance::Fast,
        Some(t) if avg_days >= t.slow_min => Performance::Slow,
        _ => Performance::Normal,
    }
}

pub fn column_view(deals: &[Deal], stage_id: &str) -> ColumnView {
    ColumnView {
        deals: deals_in_stage(deals, stage_id).into_iter().cloned().collect(),
        total_value: total_value(deals, stage_id),
        analytics: stage_analytics(deals, stage_id),
    }
}
