use chrono::NaiveDate;
use serde::Serialize;

use super::stages::{self, CLOSED_WON};
use crate::models::Deal;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub total_deals: usize,
    pub open_deals: usize,
    pub open_value: f64,
    pub won_value: f64,
    pub weighted_forecast: f64,
    pub average_deal_size: f64,
    pub win_share: f64,
}

/// Headline numbers over every deal that appears on the board.
pub fn calculate_summary(deals: &[Deal]) -> PipelineSummary {
    let on_board: Vec<_> = deals.iter().filter(|d| stages::is_known(&d.stage)).collect();
    let (won, open): (Vec<&Deal>, Vec<&Deal>) =
        on_board.iter().copied().partition(|d| d.stage == CLOSED_WON);

    let total_deals = on_board.len();
    let board_value: f64 = on_board.iter().map(|d| d.value.value()).sum();
    let open_value: f64 = open.iter().map(|d| d.value.value()).sum();
    let won_value: f64 = won.iter().map(|d| d.value.value()).sum();

    let weighted_forecast = open
        .iter()
        .map(|d| d.value.value() * f64::from(d.probability.min(100)) / 100.0)
        .sum();

    #[allow(clippy::cast_precision_loss)]
    let average_deal_size = board_value / total_deals.max(1) as f64;

    #[allow(clippy::cast_precision_loss)]
    let win_share = (won.len() as f64 / total_deals.max(1) as f64) * 100.0;

    PipelineSummary {
        total_deals,
        open_deals: open.len(),
        open_value,
        won_value,
        weighted_forecast,
        average_deal_size,
        win_share,
    }
}

/// How close a deal is to its expected close date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "days", rename_all = "lowercase")]
pub enum CloseOutlook {
    Overdue,
    Today,
    Tomorrow,
    Days(i64),
}

pub fn close_outlook(deal: &Deal, today: NaiveDate) -> Option<CloseOutlook> {
    let close = deal.expected_close_date?;
    let days = (close - today).num_days();

    Some(match days {
        d if d < 0 => CloseOutlook::Overdue,
        0 => CloseOutlook::Today,
        1 => CloseOutlook::Tomorrow,
        d => CloseOutlook::Days(d),
    })
}
