//! Insight ranking over the ROAS table.

use serde::Serialize;

use crate::metrics::{PersonaBreakdown, RoasRow};

pub const DEFAULT_HIGHLIGHT_SIZE: usize = 5;

/// ROAS below this value means the influencer earned back less than they were paid.
pub const BREAK_EVEN_ROAS: f64 = 1.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    pub top: Vec<RoasRow>,
    pub poor: Vec<RoasRow>,
}

impl Highlights {
    pub fn from_roas(rows: &[RoasRow], limit: usize) -> Self {
        Self {
            top: top_by_roas(rows, limit),
            poor: poor_by_roas(rows, limit),
        }
    }
}

/// Up to `limit` rows with the highest ROAS, best first.
pub fn top_by_roas(rows: &[RoasRow], limit: usize) -> Vec<RoasRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| b.roas.total_cmp(&a.roas));
    ranked.truncate(limit);
    ranked
}

/// Up to `limit` rows below break-even, worst first.
pub fn poor_by_roas(rows: &[RoasRow], limit: usize) -> Vec<RoasRow> {
    let mut ranked: Vec<RoasRow> = rows
        .iter()
        .filter(|row| row.roas < BREAK_EVEN_ROAS)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| a.roas.total_cmp(&b.roas));
    ranked.truncate(limit);
    ranked
}

/// Orders persona groups by descending average ROAS; ties keep their existing order.
pub fn rank_personas(breakdown: &mut PersonaBreakdown) {
    breakdown
        .rows
        .sort_by(|a, b| b.avg_roas.total_cmp(&a.avg_roas));
}
