//! Player state and the bookkeeping of a completed activity.

use serde::{Deserialize, Serialize};

use crate::buffs::Buffs;
use crate::config::GameConfig;
use crate::modifiers::{Execution, CLEAN_EXECUTION_REWARD};

/// One seat at the table.
///
/// `bp` may go negative; `coins` never does. `time` and `activity_index`
/// only ever grow. Activities `[0, activity_index)` are done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: String,
    pub nickname: String,
    pub bp: i32,
    pub coins: i32,
    pub workers: u32,
    pub machines: u32,
    pub productivity: i32,
    /// Cumulative weeks elapsed.
    pub time: i32,
    pub activity_index: usize,
    #[serde(default)]
    pub buffs: Buffs,
}

impl PlayerState {
    pub fn new(id: &str, nickname: &str, config: &GameConfig) -> Self {
        Self {
            id: id.to_string(),
            nickname: nickname.to_string(),
            bp: config.starting_bp,
            coins: config.starting_coins,
            workers: config.starting_workers,
            machines: config.starting_machines,
            productivity: 0,
            time: 0,
            activity_index: 0,
            buffs: Buffs::new(),
        }
    }

    /// True once the cursor has passed the last of `total` activities.
    pub fn is_done(&self, total: usize) -> bool {
        self.activity_index >= total
    }

    /// Pay coins, never going below zero. False if the player cannot afford it.
    pub fn spend_coins(&mut self, amount: i32) -> bool {
        if amount < 0 || amount > self.coins {
            return false;
        }
        self.coins -= amount;
        true
    }

    /// Book an execution: elapsed time, spent budget, card gains, the
    /// clean-execution reward, then advance the cursor and tick buffs.
    ///
    /// The card's buff grant joins the active buffs before the tick, so a
    /// grant of `turns = N` covers the following `N - 1` activities.
    pub fn complete_activity(&mut self, execution: &Execution) {
        let effect = &execution.card.effect;
        if let (Some(grant), Some(id)) = (effect.buff, execution.card.card_id.as_deref()) {
            self.buffs.grant(id, grant);
        }
        self.time += execution.actual_time;
        self.bp -= execution.actual_cost;
        self.productivity += effect.prod_delta;
        self.coins = (self.coins + effect.coin_delta).max(0);
        if execution.clean {
            self.coins += CLEAN_EXECUTION_REWARD;
        }
        self.activity_index += 1;
        self.buffs.advance_turn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffs::BuffEffect;
    use crate::catalog::{Activity, BuffGrant, Dependency};
    use crate::modifiers::{resolve_execution, CardApplication};
    use std::collections::HashSet;

    fn activity() -> Activity {
        Activity {
            id: "A01".to_string(),
            name: "Site Setup".to_string(),
            base_time: 2,
            base_cost: 4,
            req_workers: 2,
            req_machines: 1,
            dep: Dependency::None,
        }
    }

    #[test]
    fn test_new_player_uses_config() {
        let p = PlayerState::new("id", "Ada", &GameConfig::default());
        assert_eq!((p.bp, p.coins, p.workers, p.machines), (30, 6, 3, 1));
        assert_eq!(p.activity_index, 0);
        assert!(p.buffs.is_empty());
    }

    #[test]
    fn test_spend_coins() {
        let mut p = PlayerState::new("id", "Ada", &GameConfig::default());
        assert!(p.spend_coins(2));
        assert_eq!(p.coins, 4);
        assert!(!p.spend_coins(5));
        assert!(!p.spend_coins(-1));
        assert_eq!(p.coins, 4);
    }

    #[test]
    fn test_complete_activity_books_everything() {
        let mut p = PlayerState::new("id", "Ada", &GameConfig::default());
        p.buffs.grant(
            "U02",
            BuffGrant {
                effect: BuffEffect::CostMinus1,
                turns: 1,
            },
        );
        let exec = resolve_execution(&activity(), &p, &HashSet::new(), CardApplication::none());
        p.complete_activity(&exec);

        assert_eq!(p.time, 2);
        assert_eq!(p.bp, 27);
        assert_eq!(p.coins, 7, "clean execution pays one coin");
        assert_eq!(p.activity_index, 1);
        assert!(p.buffs.is_empty(), "one-turn buff expires after use");
    }

    #[test]
    fn test_card_grant_is_ticked_with_the_turn() {
        let mut p = PlayerState::new("id", "Ada", &GameConfig::default());
        let mut application = CardApplication::none();
        application.card_id = Some("U01".to_string());
        application.effect.buff = Some(BuffGrant {
            effect: BuffEffect::TimeMinus1,
            turns: 2,
        });
        let exec = resolve_execution(&activity(), &p, &HashSet::new(), application);
        assert_eq!(exec.actual_time, 2, "a fresh grant does not help its own turn");
        p.complete_activity(&exec);

        let buffs: Vec<_> = p.buffs.iter().cloned().collect();
        assert_eq!(buffs.len(), 1);
        assert_eq!(buffs[0].remaining_turns, 1);
    }

    #[test]
    fn test_budget_may_go_negative() {
        let mut p = PlayerState::new("id", "Ada", &GameConfig::default());
        p.bp = 1;
        let exec = resolve_execution(&activity(), &p, &HashSet::new(), CardApplication::none());
        p.complete_activity(&exec);
        assert_eq!(p.bp, -3);
    }
}
