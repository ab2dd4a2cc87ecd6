//! Post-game ranking over time, budget and productivity.
//!
//! `score = 0.4 · (min_time / time) + 0.4 · (min_bp / max(1, bp)) + 0.2 · productivity`
//!
//! `min_time` and `min_bp` are the lowest values at the table. A player who
//! spent no time at all gets the full time ratio of 1.0. Higher is better.

use serde::{Deserialize, Serialize};

use crate::player::PlayerState;

pub const TIME_WEIGHT: f64 = 0.4;
pub const COST_WEIGHT: f64 = 0.4;
pub const PRODUCTIVITY_WEIGHT: f64 = 0.2;

/// One row of the final table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based; tied players share a rank.
    pub rank: usize,
    pub player_id: String,
    pub nickname: String,
    pub score: f64,
    pub time: i32,
    pub bp: i32,
    pub productivity: i32,
}

/// Score one player against the table minimums.
pub fn final_score(player: &PlayerState, min_time: i32, min_bp: i32) -> f64 {
    let time_ratio = if player.time == 0 {
        1.0
    } else {
        f64::from(min_time) / f64::from(player.time)
    };
    let cost_ratio = f64::from(min_bp) / f64::from(player.bp.max(1));
    TIME_WEIGHT * time_ratio
        + COST_WEIGHT * cost_ratio
        + PRODUCTIVITY_WEIGHT * f64::from(player.productivity)
}

/// Players ranked best first. Ties keep turn order and share a rank.
pub fn final_standings(players: &[PlayerState]) -> Vec<Standing> {
    let (Some(min_time), Some(min_bp)) = (
        players.iter().map(|p| p.time).min(),
        players.iter().map(|p| p.bp).min(),
    ) else {
        return Vec::new();
    };

    let mut rows: Vec<Standing> = players
        .iter()
        .map(|p| Standing {
            rank: 0,
            player_id: p.id.clone(),
            nickname: p.nickname.clone(),
            score: final_score(p, min_time, min_bp),
            time: p.time,
            bp: p.bp,
            productivity: p.productivity,
        })
        .collect();
    // Stable sort keeps seat order among equal scores
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut previous: Option<f64> = None;
    for i in 0..rows.len() {
        if previous != Some(rows[i].score) {
            rows[i].rank = i + 1;
        } else {
            rows[i].rank = rows[i - 1].rank;
        }
        previous = Some(rows[i].score);
    }
    rows
}
