//! SiteCraft room service.
//!
//! Wraps the pure engine in `sitecraft-logic` with room bookkeeping:
//! room codes and player ids, sessions, and the stores that keep rooms
//! between actions. Transport (sockets, HTTP) is left to the embedding
//! application, which calls [`GameService`] and broadcasts the returned
//! [`RoomView`].
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`codes`] | Room code and player id generation |
//! | [`config`] | `ServerConfig` with `SITECRAFT_*` env overrides |
//! | [`service`] | Entry points: create, join, start, roll, apply |
//! | [`snapshot`] | Stored room documents and activity-shape normalization |
//! | [`store`] | `RoomStore` trait, registry, file store, fallback |

pub mod codes;
pub mod config;
pub mod service;
pub mod snapshot;
pub mod store;

pub use config::ServerConfig;
pub use service::{GameService, OfferedCard, RoomView, ServiceError};
pub use store::{FallbackStore, FileRoomStore, RoomRegistry, RoomStore, StoreError};
