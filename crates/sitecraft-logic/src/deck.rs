//! Per-type draw/discard piles with reshuffle-on-exhaustion.
//!
//! Invariant: for every deck, `draw ∪ discard` is exactly the deck's card
//! set, with no id lost and none duplicated. Peeking ([`Deck::draw_top`]) never
//! moves cards; only [`Deck::pop_top`] and [`Deck::take`] move one card
//! from draw to discard.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, DeckType};

/// One deck's two piles. Index 0 of `draw` is the top card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub draw: Vec<String>,
    pub discard: Vec<String>,
}

impl Deck {
    /// A fresh deck with all ids shuffled into the draw pile.
    pub fn shuffled(mut ids: Vec<String>, rng: &mut impl Rng) -> Self {
        ids.shuffle(rng);
        Self {
            draw: ids,
            discard: Vec::new(),
        }
    }

    /// When fewer than `n` cards remain, shuffle discard back into draw.
    fn refill_if_short(&mut self, n: usize, rng: &mut impl Rng) {
        if self.draw.len() >= n || self.discard.is_empty() {
            return;
        }
        let mut pool = std::mem::take(&mut self.draw);
        pool.append(&mut self.discard);
        pool.shuffle(rng);
        self.draw = pool;
        log::debug!("deck reshuffled, {} cards in draw", self.draw.len());
    }

    /// Peek at the top `n` ids, refilling first if needed. Nothing moves.
    ///
    /// Returns fewer than `n` ids only when the whole deck is smaller than `n`.
    pub fn draw_top(&mut self, n: usize, rng: &mut impl Rng) -> Vec<String> {
        self.refill_if_short(n, rng);
        self.draw.iter().take(n).cloned().collect()
    }

    /// Draw the top card and move it to discard.
    pub fn pop_top(&mut self, rng: &mut impl Rng) -> Option<String> {
        self.refill_if_short(1, rng);
        if self.draw.is_empty() {
            return None;
        }
        let id = self.draw.remove(0);
        self.discard.push(id.clone());
        Some(id)
    }

    /// Move a specific card from draw to discard. False if it is not in draw.
    pub fn take(&mut self, id: &str) -> bool {
        match self.draw.iter().position(|c| c == id) {
            Some(pos) => {
                let card = self.draw.remove(pos);
                self.discard.push(card);
                true
            }
            None => false,
        }
    }

    pub fn in_draw(&self, id: &str) -> bool {
        self.draw.iter().any(|c| c == id)
    }

    /// Total cards across both piles.
    pub fn len(&self) -> usize {
        self.draw.len() + self.discard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every id across both piles, sorted.
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.draw.iter().chain(&self.discard).cloned().collect();
        ids.sort();
        ids
    }
}

/// The four decks of a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decks {
    #[serde(rename = "FIN")]
    pub fin: Deck,
    #[serde(rename = "SITE")]
    pub site: Deck,
    #[serde(rename = "UPG")]
    pub upg: Deck,
    #[serde(rename = "PROD")]
    pub prod: Deck,
}

impl Decks {
    /// Build all four decks from the catalog, each independently shuffled.
    pub fn from_catalog(catalog: &Catalog, rng: &mut impl Rng) -> Self {
        Self {
            fin: Deck::shuffled(catalog.deck_ids(DeckType::Fin), rng),
            site: Deck::shuffled(catalog.deck_ids(DeckType::Site), rng),
            upg: Deck::shuffled(catalog.deck_ids(DeckType::Upg), rng),
            prod: Deck::shuffled(catalog.deck_ids(DeckType::Prod), rng),
        }
    }

    pub fn get(&self, deck: DeckType) -> &Deck {
        match deck {
            DeckType::Fin => &self.fin,
            DeckType::Site => &self.site,
            DeckType::Upg => &self.upg,
            DeckType::Prod => &self.prod,
        }
    }

    pub fn get_mut(&mut self, deck: DeckType) -> &mut Deck {
        match deck {
            DeckType::Fin => &mut self.fin,
            DeckType::Site => &mut self.site,
            DeckType::Upg => &mut self.upg,
            DeckType::Prod => &mut self.prod,
        }
    }

    /// True when every deck still holds exactly its catalog card set.
    pub fn is_conserved(&self, catalog: &Catalog) -> bool {
        DeckType::ALL.iter().all(|&deck| {
            let mut expected = catalog.deck_ids(deck);
            expected.sort();
            self.get(deck).all_ids() == expected
        })
    }
}
