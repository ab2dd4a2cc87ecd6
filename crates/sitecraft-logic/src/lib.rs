//! Pure game logic for SiteCraft.
//!
//! This crate contains the authoritative turn-resolution engine, independent
//! of any transport, store, or runtime. Functions take plain data (and an
//! injected RNG) and return results, making them unit-testable and
//! deterministic under a seeded generator.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`buffs`] | Timed player buffs with a single advance-one-turn step |
//! | [`catalog`] | Embedded activity schedule and card decks, validated on load |
//! | [`config`] | Per-room tunables (starting stock, table limits, choice cost) |
//! | [`deck`] | Draw/discard piles with reshuffle-on-exhaustion |
//! | [`dependency`] | FS / SS prerequisite evaluation |
//! | [`dice`] | d6 face to card-type mapping |
//! | [`game`] | Room lifecycle and the roll/apply turn protocol |
//! | [`modifiers`] | Buff, penalty, bonus and card pipeline for one execution |
//! | [`player`] | Player state and activity bookkeeping |
//! | [`scoring`] | Final score and standings |

pub mod buffs;
pub mod catalog;
pub mod config;
pub mod deck;
pub mod dependency;
pub mod dice;
pub mod game;
pub mod modifiers;
pub mod player;
pub mod scoring;

pub use catalog::{Catalog, CatalogError, DeckType};
pub use config::GameConfig;
pub use game::{GameError, GameState, RoomStatus, TurnChoice, TurnContext, TurnResolution};
pub use player::PlayerState;
