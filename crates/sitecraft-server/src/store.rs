//! Room stores — where rooms live between actions.
//!
//! | Store | Backing | Notes |
//! |-------|---------|-------|
//! | [`RoomRegistry`] | memory | capacity-bounded, evicts finished rooms first |
//! | [`FileRoomStore`] | one JSON file per room | shape-normalized on load |
//! | [`FallbackStore`] | primary + registry | serves from memory while the primary fails |

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use sitecraft_logic::{Catalog, GameState, RoomStatus};

use crate::snapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("room document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("room document is malformed: {0}")]
    Malformed(String),
    #[error("unsupported room document version {0}")]
    Version(u32),
    #[error("room registry is full ({0} rooms)")]
    Full(usize),
    #[error("room store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// The backing store could not be reached, as opposed to a stored
    /// room that exists but cannot be read.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Unavailable(_))
    }
}

/// Keyed room persistence by room code.
pub trait RoomStore {
    fn load(&mut self, code: &str) -> Result<Option<GameState>, StoreError>;
    fn save(&mut self, state: &GameState) -> Result<(), StoreError>;
    /// Deleting an absent room is not an error.
    fn delete(&mut self, code: &str) -> Result<(), StoreError>;
}

// ── In-memory registry ─────────────────────────────────────────────────

/// Explicit in-memory room table.
///
/// New rooms are admitted while below capacity. At capacity, finished
/// rooms are evicted oldest first; if none are finished the save fails
/// with [`StoreError::Full`]. Updates to existing rooms always succeed.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: HashMap<String, (u64, GameState)>,
    capacity: usize,
    next_seq: u64,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            capacity,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    /// Room codes, oldest first.
    pub fn codes(&self) -> Vec<String> {
        let mut entries: Vec<(&u64, &String)> = self
            .rooms
            .iter()
            .map(|(code, (seq, _))| (seq, code))
            .collect();
        entries.sort();
        entries.into_iter().map(|(_, code)| code.clone()).collect()
    }

    /// Drop every finished room. Returns how many were evicted.
    pub fn evict_finished(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|code, (_, state)| {
            let keep = state.status != RoomStatus::Finished;
            if !keep {
                log::info!("evicting finished room {code}");
            }
            keep
        });
        before - self.rooms.len()
    }

    fn evict_oldest_finished(&mut self) -> bool {
        let oldest = self
            .rooms
            .iter()
            .filter(|(_, (_, state))| state.status == RoomStatus::Finished)
            .min_by_key(|(_, (seq, _))| *seq)
            .map(|(code, _)| code.clone());
        match oldest {
            Some(code) => {
                log::info!("evicting finished room {code} to make space");
                self.rooms.remove(&code);
                true
            }
            None => false,
        }
    }
}

impl RoomStore for RoomRegistry {
    fn load(&mut self, code: &str) -> Result<Option<GameState>, StoreError> {
        Ok(self.rooms.get(code).map(|(_, state)| state.clone()))
    }

    fn save(&mut self, state: &GameState) -> Result<(), StoreError> {
        if let Some((_, existing)) = self.rooms.get_mut(&state.room_code) {
            *existing = state.clone();
            return Ok(());
        }
        if self.rooms.len() >= self.capacity && !self.evict_oldest_finished() {
            return Err(StoreError::Full(self.capacity));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.rooms.insert(state.room_code.clone(), (seq, state.clone()));
        Ok(())
    }

    fn delete(&mut self, code: &str) -> Result<(), StoreError> {
        self.rooms.remove(code);
        Ok(())
    }
}

// ── File store ─────────────────────────────────────────────────────────

/// One pretty-printed JSON document per room: `<dir>/<CODE>.json`.
#[derive(Debug, Clone)]
pub struct FileRoomStore {
    dir: PathBuf,
    catalog: Arc<Catalog>,
}

impl FileRoomStore {
    /// The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>, catalog: Arc<Catalog>) -> Self {
        Self {
            dir: dir.into(),
            catalog,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.json"))
    }
}

impl RoomStore for FileRoomStore {
    fn load(&mut self, code: &str) -> Result<Option<GameState>, StoreError> {
        let raw = match fs::read_to_string(self.path(code)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        snapshot::decode(&raw, &self.catalog).map(Some)
    }

    fn save(&mut self, state: &GameState) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = snapshot::encode(state, &self.catalog)?;
        // Write-then-rename so readers never see a half-written room
        let tmp = self.dir.join(format!("{}.json.tmp", state.room_code));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path(&state.room_code))?;
        Ok(())
    }

    fn delete(&mut self, code: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(code)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

// ── Fallback ───────────────────────────────────────────────────────────

/// A primary store backed by an in-memory registry.
///
/// When the primary is unavailable, the registry serves the room and the
/// failure is logged. A room the primary holds but cannot read is an
/// error, never a miss. A room saved to the primary is dropped from the
/// registry.
#[derive(Debug)]
pub struct FallbackStore<P> {
    primary: P,
    fallback: RoomRegistry,
}

impl<P: RoomStore> FallbackStore<P> {
    pub fn new(primary: P, fallback: RoomRegistry) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> &RoomRegistry {
        &self.fallback
    }
}

impl<P: RoomStore> RoomStore for FallbackStore<P> {
    fn load(&mut self, code: &str) -> Result<Option<GameState>, StoreError> {
        if let Some(state) = self.fallback.load(code)? {
            return Ok(Some(state));
        }
        match self.primary.load(code) {
            Err(e) if e.is_unavailable() => {
                log::warn!("room store load failed for {code}, using in-memory fallback: {e}");
                Ok(None)
            }
            other => other,
        }
    }

    fn save(&mut self, state: &GameState) -> Result<(), StoreError> {
        match self.primary.save(state) {
            Ok(()) => self.fallback.delete(&state.room_code),
            Err(e) => {
                log::warn!(
                    "room store save failed for {}, keeping it in memory: {e}",
                    state.room_code
                );
                self.fallback.save(state)
            }
        }
    }

    fn delete(&mut self, code: &str) -> Result<(), StoreError> {
        self.fallback.delete(code)?;
        if let Err(e) = self.primary.delete(code) {
            log::warn!("room store delete failed for {code}: {e}");
        }
        Ok(())
    }
}
