//! Game configuration — player starting stock and table limits.
//!
//! Everything here is tunable per room. The dice mapping, penalties, the
//! clean-execution reward and the score weights are fixed rules and live
//! as constants next to the code that applies them.

use serde::{Deserialize, Serialize};

/// Per-room tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Budget points each player starts with.
    pub starting_bp: i32,
    pub starting_coins: i32,
    /// Fixed worker capacity for the whole game.
    pub starting_workers: u32,
    /// Fixed machine capacity for the whole game.
    pub starting_machines: u32,
    /// Players needed before the host may start.
    pub min_players: usize,
    /// Lobby cap; joins beyond this are refused.
    pub max_players: usize,
    /// Cards peeked per roll.
    pub offer_size: usize,
    /// Coins paid to pick one of the offered cards instead of the top card.
    pub choice_cost: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_bp: 30,
            starting_coins: 6,
            starting_workers: 3,
            starting_machines: 1,
            min_players: 2,
            max_players: 6,
            offer_size: 2,
            choice_cost: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.starting_bp, 30);
        assert_eq!(config.starting_coins, 6);
        assert_eq!(config.min_players, 2);
        assert_eq!(config.offer_size, 2);
        assert_eq!(config.choice_cost, 2);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"max_players": 4}"#).unwrap();
        assert_eq!(config.max_players, 4);
        assert_eq!(config.starting_bp, 30);
    }
}
