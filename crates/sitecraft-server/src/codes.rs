//! Room codes and player ids.

use rand::Rng;
use uuid::{Builder, Uuid};

/// A random code of `len` characters drawn from `alphabet`.
pub fn generate_room_code(rng: &mut impl Rng, len: usize, alphabet: &str) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    (0..len).map(|_| chars[rng.gen_range(0..chars.len())]).collect()
}

/// Canonical form of a user-typed room code.
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// A version-4 UUID drawn from `rng`, so seeded services hand out
/// reproducible ids.
pub fn new_player_id(rng: &mut impl Rng) -> String {
    let id: Uuid = Builder::from_random_bytes(rng.gen()).into_uuid();
    id.to_string()
}
