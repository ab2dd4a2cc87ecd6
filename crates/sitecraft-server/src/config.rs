//! Service configuration, with environment overrides.

use std::path::PathBuf;

use sitecraft_logic::GameConfig;

/// Characters used in room codes; no 0/O or 1/I.
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory for per-room JSON files; `None` keeps rooms in memory only.
    pub data_dir: Option<PathBuf>,
    pub room_code_len: usize,
    pub room_code_alphabet: String,
    /// Capacity of the in-memory room registry.
    pub max_rooms: usize,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            room_code_len: 5,
            room_code_alphabet: ROOM_CODE_ALPHABET.to_string(),
            max_rooms: 1024,
            seed: None,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `SITECRAFT_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup("SITECRAFT_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(len) = parse_var(&lookup, "SITECRAFT_ROOM_CODE_LEN") {
            if len > 0 {
                config.room_code_len = len;
            }
        }
        if let Some(max) = parse_var(&lookup, "SITECRAFT_MAX_ROOMS") {
            config.max_rooms = max;
        }
        config.seed = parse_var(&lookup, "SITECRAFT_SEED");
        config
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: not a valid number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.room_code_len, 5);
        assert_eq!(config.max_rooms, 1024);
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SITECRAFT_DATA_DIR", "/tmp/rooms"),
            ("SITECRAFT_ROOM_CODE_LEN", "6"),
            ("SITECRAFT_MAX_ROOMS", "8"),
            ("SITECRAFT_SEED", "42"),
        ]));
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/rooms")));
        assert_eq!(config.room_code_len, 6);
        assert_eq!(config.max_rooms, 8);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_bad_values_ignored() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SITECRAFT_ROOM_CODE_LEN", "zero"),
            ("SITECRAFT_SEED", "-1"),
            ("SITECRAFT_DATA_DIR", "  "),
        ]));
        assert_eq!(config.room_code_len, 5);
        assert_eq!(config.seed, None);
        assert_eq!(config.data_dir, None);
    }
}
