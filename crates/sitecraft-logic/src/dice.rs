//! Dice resolution — a d6 face selects which deck (if any) offers cards.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::DeckType;

/// The card phase a face selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    #[serde(rename = "PROD")]
    Prod,
    #[serde(rename = "UPG")]
    Upg,
    #[serde(rename = "FIN")]
    Fin,
    #[serde(rename = "SITE")]
    Site,
    /// The acting player names the deck.
    #[serde(rename = "CHOICE")]
    Choice,
    /// No card phase this turn.
    #[serde(rename = "NONE")]
    NoCard,
}

/// Face `n` maps to `FACE_TABLE[n - 1]`.
pub const FACE_TABLE: [CardType; 6] = [
    CardType::Prod,
    CardType::Upg,
    CardType::Fin,
    CardType::Site,
    CardType::Choice,
    CardType::NoCard,
];

/// Deck used when a CHOICE roll names none.
pub const DEFAULT_CHOICE_DECK: DeckType = DeckType::Fin;

impl CardType {
    /// The card type for a face, or `None` outside 1..=6.
    pub fn for_face(face: u8) -> Option<CardType> {
        FACE_TABLE.get(usize::from(face).checked_sub(1)?).copied()
    }

    /// The deck this card type draws from, given the player's choice.
    pub fn deck(self, chosen: Option<DeckType>) -> Option<DeckType> {
        match self {
            CardType::Prod => Some(DeckType::Prod),
            CardType::Upg => Some(DeckType::Upg),
            CardType::Fin => Some(DeckType::Fin),
            CardType::Site => Some(DeckType::Site),
            CardType::Choice => Some(chosen.unwrap_or(DEFAULT_CHOICE_DECK)),
            CardType::NoCard => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CardType::Prod => "PROD",
            CardType::Upg => "UPG",
            CardType::Fin => "FIN",
            CardType::Site => "SITE",
            CardType::Choice => "CHOICE",
            CardType::NoCard => "NONE",
        }
    }
}

/// A rolled face and the card type it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceOutcome {
    pub face: u8,
    pub card_type: CardType,
}

/// Roll a fair d6.
pub fn roll_dice(rng: &mut impl Rng) -> DiceOutcome {
    let face: u8 = rng.gen_range(1..=6);
    DiceOutcome {
        face,
        card_type: FACE_TABLE[usize::from(face) - 1],
    }
}
