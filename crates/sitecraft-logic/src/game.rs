//! Turn state machine — room lifecycle, turn rotation, and the two-phase
//! roll/apply protocol.
//!
//! ```text
//! LOBBY ──start──▶ ACTIVE ──last activity applied──▶ FINISHED
//!                   │  ▲
//!      roll_and_offer  apply_turn (rotates turn, bumps round on wrap)
//! ```
//!
//! Every action validates completely before it touches state, so a
//! rejected action leaves the room exactly as it was and writes nothing to
//! the room log. The catalog is always passed in; rooms never hold a copy.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffs::BuffEffect;
use crate::catalog::{Catalog, DeckType};
use crate::config::GameConfig;
use crate::deck::Decks;
use crate::dice::{roll_dice, CardType, DiceOutcome};
use crate::modifiers::{preview_warnings, resolve_execution, CardApplication, Delta};
use crate::player::PlayerState;
use crate::scoring::{final_standings, Standing};

// ── Errors ─────────────────────────────────────────────────────────────

/// Why an action was refused. `Display` is the text shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Not your turn.")]
    NotYourTurn,
    #[error("Game not active.")]
    NotActive,
    #[error("Game already started.")]
    AlreadyStarted,
    #[error("Need at least {0} players.")]
    NotEnoughPlayers(usize),
    #[error("Only host can start.")]
    NotHost,
    #[error("Roll first.")]
    RollRequired,
    #[error("Already rolled this turn.")]
    AlreadyRolled,
    #[error("Coins spent must be 0 or {0}.")]
    InvalidCoinSpend(i32),
    #[error("Not enough coins.")]
    NotEnoughCoins,
    #[error("Invalid chosen card.")]
    InvalidCardChoice,
    #[error("Chosen deck does not match the offered deck.")]
    DeckMismatch,
    #[error("Room is full.")]
    RoomFull,
    #[error("Unknown player {0}.")]
    UnknownPlayer(String),
    #[error("Game not finished.")]
    NotFinished,
    /// Room or catalog data is inconsistent; fatal to the action.
    #[error("Invalid game data: {0}")]
    Integrity(String),
}

impl GameError {
    /// True for ordinary refusals, false for data-integrity failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GameError::Integrity(_))
    }
}

// ── Room state ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomStatus {
    Lobby,
    Active,
    Finished,
}

/// The pending turn between roll and apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnContext {
    pub active_player_id: String,
    #[serde(default)]
    pub roll: Option<DiceOutcome>,
    /// Deck the offer was drawn from; `None` on a roll of 6.
    #[serde(default)]
    pub deck: Option<DeckType>,
    #[serde(default)]
    pub offered_card_ids: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl TurnContext {
    fn open(player_id: &str) -> Self {
        Self {
            active_player_id: player_id.to_string(),
            roll: None,
            deck: None,
            offered_card_ids: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn has_rolled_for(&self, player_id: &str) -> bool {
        self.roll.is_some() && self.active_player_id == player_id
    }
}

/// The acting player's decision for the apply phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnChoice {
    /// 0 takes the top card; the configured choice cost picks an offered one.
    pub coins_spent: i32,
    #[serde(default)]
    pub chosen_card_id: Option<String>,
    /// Only meaningful after a CHOICE roll; must match the offered deck.
    #[serde(default)]
    pub chosen_deck: Option<DeckType>,
}

impl TurnChoice {
    /// Take whatever is on top.
    pub fn top_card() -> Self {
        Self::default()
    }

    /// Pay to take a specific offered card.
    pub fn pick(card_id: &str, cost: i32) -> Self {
        Self {
            coins_spent: cost,
            chosen_card_id: Some(card_id.to_string()),
            chosen_deck: None,
        }
    }
}

/// What the last applied turn did, kept for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResolution {
    pub player_id: String,
    pub activity_id: String,
    pub roll: DiceOutcome,
    pub coins_spent: i32,
    pub card_id: Option<String>,
    pub site_ignored: bool,
    pub actual_time: i32,
    pub actual_cost: i32,
    pub prereq_penalty: Delta,
    pub resource_penalty: Delta,
    pub overlap_bonus: i32,
    pub clean: bool,
    pub warnings: Vec<String>,
}

/// One room's complete mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub room_code: String,
    pub status: RoomStatus,
    pub host_player_id: String,
    pub round: u32,
    pub turn_index: usize,
    /// Insertion order is turn order.
    pub players: Vec<PlayerState>,
    pub decks: Decks,
    pub log: Vec<String>,
    #[serde(default)]
    pub current_turn: Option<TurnContext>,
    #[serde(default)]
    pub last_resolution: Option<TurnResolution>,
    #[serde(default)]
    pub config: GameConfig,
}

impl GameState {
    /// A fresh lobby with the host seated and all decks shuffled.
    pub fn new(
        room_code: &str,
        host_id: &str,
        host_nickname: &str,
        config: GameConfig,
        catalog: &Catalog,
        rng: &mut impl Rng,
    ) -> Self {
        let host = PlayerState::new(host_id, host_nickname, &config);
        Self {
            room_code: room_code.to_string(),
            status: RoomStatus::Lobby,
            host_player_id: host_id.to_string(),
            round: 1,
            turn_index: 0,
            players: vec![host],
            decks: Decks::from_catalog(catalog, rng),
            log: vec![format!("Room {room_code} created.")],
            current_turn: None,
            last_resolution: None,
            config,
        }
    }

    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The player whose turn it is.
    pub fn active_player(&self) -> Option<&PlayerState> {
        self.players.get(self.turn_index)
    }

    /// True when every player has completed every activity.
    pub fn is_complete(&self, catalog: &Catalog) -> bool {
        let total = catalog.activity_count();
        !self.players.is_empty() && self.players.iter().all(|p| p.is_done(total))
    }

    // ── Lobby ──

    /// Seat a new player. Only allowed in the lobby and below the cap.
    pub fn add_player(&mut self, id: &str, nickname: &str) -> Result<&PlayerState, GameError> {
        if self.status != RoomStatus::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::RoomFull);
        }
        self.players.push(PlayerState::new(id, nickname, &self.config));
        self.log.push(format!("{nickname} joined."));
        log::info!("room {}: {} joined ({} players)", self.room_code, nickname, self.players.len());
        Ok(&self.players[self.players.len() - 1])
    }

    /// Host starts the game; the first seated player acts first.
    pub fn start(&mut self, requester_id: &str) -> Result<(), GameError> {
        if self.player(requester_id).is_none() {
            return Err(GameError::UnknownPlayer(requester_id.to_string()));
        }
        if requester_id != self.host_player_id {
            return Err(GameError::NotHost);
        }
        if self.status != RoomStatus::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers(self.config.min_players));
        }
        let first = self.players[0].id.clone();
        self.status = RoomStatus::Active;
        self.round = 1;
        self.turn_index = 0;
        self.current_turn = Some(TurnContext::open(&first));
        self.last_resolution = None;
        self.log.push("Game started.".to_string());
        log::info!("room {}: game started with {} players", self.room_code, self.players.len());
        Ok(())
    }

    // ── Turn phases ──

    fn check_actor(&self, player_id: &str) -> Result<&PlayerState, GameError> {
        if self.status != RoomStatus::Active {
            return Err(GameError::NotActive);
        }
        let active = self.active_player().ok_or_else(|| {
            GameError::Integrity(format!("turn index {} has no player", self.turn_index))
        })?;
        if active.id != player_id {
            return Err(GameError::NotYourTurn);
        }
        Ok(active)
    }

    /// Roll the die and peek at the offer. `chosen_deck` only matters on a 5.
    pub fn roll_and_offer(
        &mut self,
        player_id: &str,
        chosen_deck: Option<DeckType>,
        catalog: &Catalog,
        rng: &mut impl Rng,
    ) -> Result<&TurnContext, GameError> {
        let active = self.check_actor(player_id)?;
        if self
            .current_turn
            .as_ref()
            .is_some_and(|ctx| ctx.has_rolled_for(player_id))
        {
            return Err(GameError::AlreadyRolled);
        }

        let completed = catalog.completed_ids(active.activity_index);
        let warnings = catalog
            .activity(active.activity_index)
            .map(|activity| preview_warnings(activity, active, &completed))
            .unwrap_or_default();

        let roll = roll_dice(rng);
        let deck = roll.card_type.deck(chosen_deck);
        let offered_card_ids = match deck {
            Some(d) => self.decks.get_mut(d).draw_top(self.config.offer_size, rng),
            None => Vec::new(),
        };
        log::debug!(
            "room {}: {} rolled {} ({}), offered {:?}",
            self.room_code,
            player_id,
            roll.face,
            roll.card_type.name(),
            offered_card_ids
        );

        Ok(&*self.current_turn.insert(TurnContext {
            active_player_id: player_id.to_string(),
            roll: Some(roll),
            deck,
            offered_card_ids,
            warnings,
        }))
    }

    /// Resolve the pending turn: take a card, run the modifier pipeline on
    /// the player's next activity, then rotate or finish.
    pub fn apply_turn(
        &mut self,
        player_id: &str,
        choice: &TurnChoice,
        catalog: &Catalog,
        rng: &mut impl Rng,
    ) -> Result<&TurnResolution, GameError> {
        // Validate everything up front; nothing below may fail after mutation.
        let active = self.check_actor(player_id)?;
        let ctx = self
            .current_turn
            .as_ref()
            .filter(|ctx| ctx.has_rolled_for(player_id))
            .ok_or(GameError::RollRequired)?;
        let roll = ctx.roll.ok_or(GameError::RollRequired)?;

        let cost = self.config.choice_cost;
        let paid = match choice.coins_spent {
            0 => false,
            n if n == cost => true,
            _ => return Err(GameError::InvalidCoinSpend(cost)),
        };
        if choice.coins_spent > active.coins {
            return Err(GameError::NotEnoughCoins);
        }
        if roll.card_type == CardType::Choice
            && choice.chosen_deck.is_some()
            && choice.chosen_deck != ctx.deck
        {
            return Err(GameError::DeckMismatch);
        }
        let picked = if paid {
            match (&choice.chosen_card_id, ctx.deck) {
                (Some(id), Some(deck))
                    if ctx.offered_card_ids.contains(id) && self.decks.get(deck).in_draw(id) =>
                {
                    Some(id.clone())
                }
                _ => return Err(GameError::InvalidCardChoice),
            }
        } else {
            None
        };
        let activity = catalog.activity(active.activity_index).ok_or_else(|| {
            GameError::Integrity(format!(
                "{} has no activity at index {}",
                active.nickname, active.activity_index
            ))
        })?;
        let deck = ctx.deck;

        // ── Mutation ──
        let idx = self.turn_index;
        let player = &mut self.players[idx];
        player.spend_coins(choice.coins_spent);

        let card_id = match (deck, picked) {
            (Some(d), Some(id)) => {
                self.decks.get_mut(d).take(&id);
                Some(id)
            }
            (Some(d), None) => self.decks.get_mut(d).pop_top(rng),
            (None, _) => None,
        };

        let application = match card_id.as_deref() {
            None => CardApplication::none(),
            Some(id) => match catalog.card(id) {
                Some(card) => {
                    let application = CardApplication::from_card(card, &player.buffs);
                    if application.site_ignored {
                        player.buffs.consume(BuffEffect::IgnoreSiteOnce);
                        self.log.push(format!(
                            "{} ignored SITE card {} ({}).",
                            player.nickname, card.id, card.title
                        ));
                    }
                    application
                }
                None => {
                    log::warn!(
                        "room {}: card {} not in catalog, applying no effect",
                        self.room_code,
                        id
                    );
                    self.log.push(format!("Card not found: {id}"));
                    CardApplication::unknown(id)
                }
            },
        };

        let completed = catalog.completed_ids(player.activity_index);
        let execution = resolve_execution(activity, player, &completed, application);
        player.complete_activity(&execution);

        let mut line = format!(
            "{} executed {} ({}) | +{}w, -{}BP, card={}",
            player.nickname,
            activity.id,
            activity.name,
            execution.actual_time,
            execution.actual_cost,
            execution.card.card_id.as_deref().unwrap_or("NONE")
        );
        if let Some(warning) = &execution.dependency.warning {
            if execution.dependency.is_penalized() {
                line.push_str(" | ");
                line.push_str(warning);
            }
        }
        self.log.push(line);
        log::debug!(
            "room {}: {} executed {} for {}w/{}BP (clean: {})",
            self.room_code,
            player.id,
            activity.id,
            execution.actual_time,
            execution.actual_cost,
            execution.clean
        );

        let resolution = TurnResolution {
            player_id: player.id.clone(),
            activity_id: activity.id.clone(),
            roll,
            coins_spent: choice.coins_spent,
            card_id: execution.card.card_id.clone(),
            site_ignored: execution.card.site_ignored,
            actual_time: execution.actual_time,
            actual_cost: execution.actual_cost,
            prereq_penalty: execution.dependency.penalty,
            resource_penalty: execution.resource_penalty,
            overlap_bonus: execution.overlap_bonus,
            clean: execution.clean,
            warnings: execution.warnings,
        };

        self.current_turn = None;
        if self.is_complete(catalog) {
            self.status = RoomStatus::Finished;
            self.log.push("Game finished.".to_string());
            log::info!("room {}: game finished after {} rounds", self.room_code, self.round);
        } else {
            self.advance_turn(catalog.activity_count());
        }

        Ok(&*self.last_resolution.insert(resolution))
    }

    /// Move to the next player who still has work, counting rounds on wrap.
    fn advance_turn(&mut self, total: usize) {
        let n = self.players.len();
        for _ in 0..n {
            self.turn_index = (self.turn_index + 1) % n;
            if self.turn_index == 0 {
                self.round += 1;
            }
            if !self.players[self.turn_index].is_done(total) {
                break;
            }
        }
    }

    // ── Results ──

    /// Ranked standings; only available once the game has finished.
    pub fn standings(&self) -> Result<Vec<Standing>, GameError> {
        if self.status != RoomStatus::Finished {
            return Err(GameError::NotFinished);
        }
        Ok(final_standings(&self.players))
    }
}
