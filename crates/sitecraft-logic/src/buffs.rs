//! Timed player buffs.
//!
//! A buff is granted by a card and counts down once per resolved turn of
//! the player who holds it. [`Buffs::advance_turn`] is the only way a
//! buff's counter moves, and it evicts expired entries in the same step.

use serde::{Deserialize, Serialize};

use crate::catalog::BuffGrant;

/// What a buff does while it is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuffEffect {
    /// -1 week on every activity executed while active.
    #[serde(rename = "TIME_MINUS_1")]
    TimeMinus1,
    /// -1 BP on every activity executed while active.
    #[serde(rename = "COST_MINUS_1")]
    CostMinus1,
    /// The next SITE card consumed has no effect; consumed on use.
    #[serde(rename = "IGNORE_SITE_ONCE")]
    IgnoreSiteOnce,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buff {
    /// Usually the id of the card that granted it.
    pub id: String,
    pub remaining_turns: u32,
    pub effect: BuffEffect,
}

/// The buffs one player holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buffs(Vec<Buff>);

impl Buffs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a buff from a card grant. Zero-turn grants are dropped.
    pub fn grant(&mut self, id: &str, grant: BuffGrant) {
        if grant.turns == 0 {
            return;
        }
        self.0.push(Buff {
            id: id.to_string(),
            remaining_turns: grant.turns,
            effect: grant.effect,
        });
    }

    /// Count of active buffs with the given effect (they stack).
    pub fn count(&self, effect: BuffEffect) -> i32 {
        self.0.iter().filter(|b| b.effect == effect).count() as i32
    }

    pub fn has(&self, effect: BuffEffect) -> bool {
        self.0.iter().any(|b| b.effect == effect)
    }

    /// Remove and return the oldest buff with `effect`.
    pub fn consume(&mut self, effect: BuffEffect) -> Option<Buff> {
        let pos = self.0.iter().position(|b| b.effect == effect)?;
        Some(self.0.remove(pos))
    }

    /// One resolved turn passes: decrement every counter, drop those at zero.
    pub fn advance_turn(&mut self) {
        for buff in &mut self.0 {
            buff.remaining_turns = buff.remaining_turns.saturating_sub(1);
        }
        self.0.retain(|b| b.remaining_turns > 0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buff> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
