//! Modifier pipeline — turns an activity plus the turn's circumstances into
//! the weeks and budget points actually spent.
//!
//! Order matters and is fixed:
//!
//! 1. base `(time, cost)`
//! 2. active buffs (`TIME_MINUS_1` / `COST_MINUS_1`, stacking), clamped at 0
//! 3. FS prerequisite penalty
//! 4. resource-shortage penalty
//! 5. SS overlap bonus
//! 6. card deltas
//! 7. clamp both sums at 0
//!
//! Clean execution (+1 coin) requires that neither the FS nor the resource
//! penalty contributed time and that the actual time did not exceed base.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::buffs::{BuffEffect, Buffs};
use crate::catalog::{Activity, Card, CardEffect, DeckType};
use crate::dependency::{self, DependencyCheck};
use crate::player::PlayerState;

/// Penalty for executing with fewer workers or machines than required.
pub const RESOURCE_PENALTY: Delta = Delta { time: 1, cost: 0 };

/// Coins awarded for a clean execution.
pub const CLEAN_EXECUTION_REWARD: i32 = 1;

/// A signed (weeks, budget points) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    pub time: i32,
    pub cost: i32,
}

impl Delta {
    pub const ZERO: Delta = Delta { time: 0, cost: 0 };

    pub fn new(time: i32, cost: i32) -> Self {
        Self { time, cost }
    }

    fn clamped(self) -> Self {
        Self {
            time: self.time.max(0),
            cost: self.cost.max(0),
        }
    }
}

impl std::ops::Add for Delta {
    type Output = Delta;

    fn add(self, rhs: Delta) -> Delta {
        Delta {
            time: self.time + rhs.time,
            cost: self.cost + rhs.cost,
        }
    }
}

// ── Individual steps ───────────────────────────────────────────────────

/// Steps 1–2: base values reduced by stacking buffs, clamped at 0.
pub fn apply_buffs(base: Delta, buffs: &Buffs) -> Delta {
    Delta {
        time: base.time - buffs.count(BuffEffect::TimeMinus1),
        cost: base.cost - buffs.count(BuffEffect::CostMinus1),
    }
    .clamped()
}

fn is_short(activity: &Activity, workers: u32, machines: u32) -> bool {
    workers < activity.req_workers || machines < activity.req_machines
}

/// Step 4: +1 week when either capacity falls short.
pub fn resource_penalty(activity: &Activity, workers: u32, machines: u32) -> Delta {
    if is_short(activity, workers, machines) {
        RESOURCE_PENALTY
    } else {
        Delta::ZERO
    }
}

/// Human-readable shortage notice, if any.
pub fn resource_warning(activity: &Activity, workers: u32, machines: u32) -> Option<String> {
    is_short(activity, workers, machines).then(|| {
        format!(
            "Resource short: need W{}/M{}, you have W{}/M{}",
            activity.req_workers, activity.req_machines, workers, machines
        )
    })
}

/// The card a turn actually applies, after `IGNORE_SITE_ONCE` is considered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardApplication {
    pub card_id: Option<String>,
    pub effect: CardEffect,
    /// A SITE card was cancelled by the player's `IGNORE_SITE_ONCE` buff.
    pub site_ignored: bool,
}

impl CardApplication {
    /// A turn with no card at all (roll of 6).
    pub fn none() -> Self {
        Self::default()
    }

    /// A drawn card, cancelled if it is SITE and the player can ignore it.
    pub fn from_card(card: &Card, buffs: &Buffs) -> Self {
        let site_ignored = card.deck == DeckType::Site && buffs.has(BuffEffect::IgnoreSiteOnce);
        Self {
            card_id: Some(card.id.clone()),
            effect: if site_ignored {
                CardEffect::default()
            } else {
                card.effect
            },
            site_ignored,
        }
    }

    /// A card id missing from the catalog: consumed, but with no effect.
    pub fn unknown(card_id: &str) -> Self {
        Self {
            card_id: Some(card_id.to_string()),
            ..Self::default()
        }
    }
}

// ── Whole pipeline ─────────────────────────────────────────────────────

/// Everything the pipeline decided for one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub base: Delta,
    pub buffed: Delta,
    pub dependency: DependencyCheck,
    pub resource_penalty: Delta,
    pub overlap_bonus: i32,
    pub card: CardApplication,
    pub actual_time: i32,
    pub actual_cost: i32,
    /// Earns [`CLEAN_EXECUTION_REWARD`].
    pub clean: bool,
    pub warnings: Vec<String>,
}

/// Run the pipeline for `activity` as executed by `player`. Pure.
pub fn resolve_execution(
    activity: &Activity,
    player: &PlayerState,
    completed: &HashSet<&str>,
    card: CardApplication,
) -> Execution {
    let base = Delta::new(activity.base_time, activity.base_cost);
    let buffed = apply_buffs(base, &player.buffs);
    let dependency = dependency::evaluate(activity, completed);
    let resource_penalty = resource_penalty(activity, player.workers, player.machines);
    let overlap_bonus = dependency::overlap_bonus(activity, player.productivity);
    let card_delta = Delta::new(card.effect.time_delta, card.effect.cost_delta);

    let total = buffed
        + dependency.penalty
        + resource_penalty
        + Delta::new(overlap_bonus, 0)
        + card_delta;
    let actual = total.clamped();

    let clean = dependency.penalty.time == 0
        && resource_penalty.time == 0
        && actual.time <= activity.base_time;

    let mut warnings = Vec::new();
    warnings.extend(dependency.warning.clone());
    warnings.extend(resource_warning(activity, player.workers, player.machines));

    Execution {
        base,
        buffed,
        dependency,
        resource_penalty,
        overlap_bonus,
        card,
        actual_time: actual.time,
        actual_cost: actual.cost,
        clean,
        warnings,
    }
}

/// Warnings a player would see for `activity` before acting.
pub fn preview_warnings(
    activity: &Activity,
    player: &PlayerState,
    completed: &HashSet<&str>,
) -> Vec<String> {
    let mut warnings = Vec::new();
    warnings.extend(dependency::evaluate(activity, completed).warning);
    warnings.extend(resource_warning(activity, player.workers, player.machines));
    warnings
}
