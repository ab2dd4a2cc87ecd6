//! Room service — the player-facing entry points.
//!
//! Each mutating call follows load → mutate → save against the injected
//! [`RoomStore`]. Calls take `&mut self`, so actions are serialized; a
//! transport layer wraps the service in whatever lock suits it. Rejected
//! actions are never saved.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use sitecraft_logic::catalog::{Activity, DeckType};
use sitecraft_logic::scoring::Standing;
use sitecraft_logic::{Catalog, CatalogError, GameError, GameState, RoomStatus, TurnChoice};

use crate::codes::{generate_room_code, new_player_id, normalize_room_code};
use crate::config::ServerConfig;
use crate::store::{FallbackStore, FileRoomStore, RoomRegistry, RoomStore, StoreError};

/// Attempts at finding an unused room code before giving up.
const ROOM_CODE_ATTEMPTS: usize = 32;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Room not found.")]
    RoomNotFound(String),
    #[error("Too many rooms.")]
    TooManyRooms,
    #[error("Unknown session.")]
    UnknownSession,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ServiceError {
    /// True when the caller asked for something not allowed, as opposed to
    /// the service failing.
    pub fn is_rejection(&self) -> bool {
        match self {
            ServiceError::RoomNotFound(_)
            | ServiceError::TooManyRooms
            | ServiceError::UnknownSession => true,
            ServiceError::Game(e) => e.is_rejection(),
            ServiceError::Store(_) | ServiceError::Catalog(_) => false,
        }
    }
}

/// Display details of an offered card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferedCard {
    pub id: String,
    pub title: String,
    pub rules_text: String,
    pub deck: DeckType,
}

/// What callers get back: the room plus everything needed to render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    /// Set on create/join: the id the caller now plays as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub room: GameState,
    pub activities: Vec<Activity>,
    pub offered_cards: Vec<OfferedCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standings: Option<Vec<Standing>>,
}

pub struct GameService<S> {
    catalog: Arc<Catalog>,
    config: ServerConfig,
    store: S,
    rng: StdRng,
    /// Player id → room code.
    sessions: HashMap<String, String>,
}

impl GameService<FallbackStore<FileRoomStore>> {
    /// File-backed service with an in-memory fallback, per `config.data_dir`.
    ///
    /// Without a data directory the primary lives under the OS temp dir.
    pub fn file_backed(config: ServerConfig) -> Result<Self, ServiceError> {
        let catalog = Arc::new(Catalog::builtin()?);
        let dir = config
            .data_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("sitecraft-rooms"));
        let store = FallbackStore::new(
            FileRoomStore::new(dir, Arc::clone(&catalog)),
            RoomRegistry::new(config.max_rooms),
        );
        Ok(Self::new(catalog, config, store))
    }
}

impl GameService<RoomRegistry> {
    /// Purely in-memory service.
    pub fn in_memory(config: ServerConfig) -> Result<Self, ServiceError> {
        let catalog = Arc::new(Catalog::builtin()?);
        let store = RoomRegistry::new(config.max_rooms);
        Ok(Self::new(catalog, config, store))
    }
}

impl<S: RoomStore> GameService<S> {
    pub fn new(catalog: Arc<Catalog>, config: ServerConfig, store: S) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            catalog,
            config,
            store,
            rng,
            sessions: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Room the player is seated in, if they have a session.
    pub fn session_room(&self, player_id: &str) -> Option<&str> {
        self.sessions.get(player_id).map(String::as_str)
    }

    // ── Entry points ──

    /// Open a new lobby with the caller as host.
    pub fn create_room(&mut self, nickname: &str) -> Result<RoomView, ServiceError> {
        let code = self.unused_room_code()?;
        let player_id = new_player_id(&mut self.rng);
        let state = GameState::new(
            &code,
            &player_id,
            nickname.trim(),
            self.config.game.clone(),
            &self.catalog,
            &mut self.rng,
        );
        match self.store.save(&state) {
            Err(StoreError::Full(_)) => return Err(ServiceError::TooManyRooms),
            other => other?,
        }
        self.sessions.insert(player_id.clone(), code.clone());
        log::info!("room {code} created by {}", nickname.trim());
        Ok(self.view(state, Some(player_id)))
    }

    /// Take a seat in an existing lobby.
    pub fn join_room(&mut self, code: &str, nickname: &str) -> Result<RoomView, ServiceError> {
        let code = normalize_room_code(code);
        let mut state = self.load(&code)?;
        let player_id = new_player_id(&mut self.rng);
        if let Err(e) = state.add_player(&player_id, nickname.trim()) {
            return Err(rejected("join", e));
        }
        self.store.save(&state)?;
        self.sessions.insert(player_id.clone(), code);
        Ok(self.view(state, Some(player_id)))
    }

    pub fn start_game(&mut self, player_id: &str) -> Result<RoomView, ServiceError> {
        let mut state = self.load_for(player_id)?;
        if let Err(e) = state.start(player_id) {
            return Err(rejected("start", e));
        }
        self.store.save(&state)?;
        Ok(self.view(state, None))
    }

    /// `chosen_deck` picks the deck on a roll of 5 (FIN when absent).
    pub fn roll_and_offer(
        &mut self,
        player_id: &str,
        chosen_deck: Option<DeckType>,
    ) -> Result<RoomView, ServiceError> {
        let mut state = self.load_for(player_id)?;
        if let Err(e) =
            state.roll_and_offer(player_id, chosen_deck, &self.catalog, &mut self.rng)
        {
            return Err(rejected("roll", e));
        }
        self.store.save(&state)?;
        Ok(self.view(state, None))
    }

    pub fn apply_turn(
        &mut self,
        player_id: &str,
        choice: &TurnChoice,
    ) -> Result<RoomView, ServiceError> {
        let mut state = self.load_for(player_id)?;
        if let Err(e) = state.apply_turn(player_id, choice, &self.catalog, &mut self.rng) {
            return Err(rejected("apply", e));
        }
        self.store.save(&state)?;
        Ok(self.view(state, None))
    }

    /// Current snapshot of a room.
    pub fn room(&mut self, code: &str) -> Result<RoomView, ServiceError> {
        let state = self.load(&normalize_room_code(code))?;
        Ok(self.view(state, None))
    }

    pub fn standings(&mut self, code: &str) -> Result<Vec<Standing>, ServiceError> {
        let state = self.load(&normalize_room_code(code))?;
        Ok(state.standings()?)
    }

    /// Forget the player's session. The seat stays in the room.
    pub fn leave(&mut self, player_id: &str) -> Option<String> {
        let code = self.sessions.remove(player_id)?;
        log::info!("player {player_id} left room {code}");
        Some(code)
    }

    /// Remove a room from the store and drop every session pointing at it.
    pub fn close_room(&mut self, code: &str) -> Result<(), ServiceError> {
        let code = normalize_room_code(code);
        self.store.delete(&code)?;
        self.sessions.retain(|_, room| *room != code);
        log::info!("room {code} closed");
        Ok(())
    }

    // ── Helpers ──

    fn unused_room_code(&mut self) -> Result<String, ServiceError> {
        for _ in 0..ROOM_CODE_ATTEMPTS {
            let code = generate_room_code(
                &mut self.rng,
                self.config.room_code_len,
                &self.config.room_code_alphabet,
            );
            match self.store.load(&code) {
                Ok(None) => return Ok(code),
                Ok(Some(_)) => {}
                // Taken by a room that cannot be read; never overwrite it
                Err(e) if !e.is_unavailable() => {
                    log::warn!("room code {code} holds an unreadable room: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
        log::warn!("no free room code after {ROOM_CODE_ATTEMPTS} attempts");
        Err(ServiceError::TooManyRooms)
    }

    fn load(&mut self, code: &str) -> Result<GameState, ServiceError> {
        self.store
            .load(code)?
            .ok_or_else(|| ServiceError::RoomNotFound(code.to_string()))
    }

    fn load_for(&mut self, player_id: &str) -> Result<GameState, ServiceError> {
        let code = self
            .sessions
            .get(player_id)
            .cloned()
            .ok_or(ServiceError::UnknownSession)?;
        self.load(&code)
    }

    fn view(&self, room: GameState, player_id: Option<String>) -> RoomView {
        let offered_cards = room
            .current_turn
            .as_ref()
            .map(|ctx| {
                ctx.offered_card_ids
                    .iter()
                    .map(|id| match self.catalog.card(id) {
                        Some(card) => OfferedCard {
                            id: card.id.clone(),
                            title: card.title.clone(),
                            rules_text: card.rules_text.clone(),
                            deck: card.deck,
                        },
                        None => OfferedCard {
                            id: id.clone(),
                            title: "Unknown".to_string(),
                            rules_text: String::new(),
                            deck: ctx.deck.unwrap_or(DeckType::Fin),
                        },
                    })
                    .collect()
            })
            .unwrap_or_default();
        let standings = (room.status == RoomStatus::Finished)
            .then(|| room.standings().ok())
            .flatten();
        RoomView {
            player_id,
            room,
            activities: self.catalog.activities().to_vec(),
            offered_cards,
            standings,
        }
    }
}

fn rejected(action: &str, err: GameError) -> ServiceError {
    if err.is_rejection() {
        log::debug!("{action} rejected: {err}");
    } else {
        log::error!("{action} failed: {err}");
    }
    ServiceError::Game(err)
}
