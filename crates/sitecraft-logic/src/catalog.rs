//! Static catalogs — the activity schedule and the four card decks.
//!
//! Both catalogs ship as JSON under `data/` and are embedded at compile
//! time. A [`Catalog`] is validated once when it is built and is immutable
//! afterwards; rooms never carry their own copy, they borrow the catalog
//! for every action.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffs::BuffEffect;

const ACTIVITIES_JSON: &str = include_str!("../../../data/activities.json");
const CARDS_JSON: &str = include_str!("../../../data/cards.json");

// ── Decks ──────────────────────────────────────────────────────────────

/// The four typed card decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeckType {
    /// Financial events, mostly budget swings.
    Fin,
    /// Site conditions, mostly schedule swings.
    Site,
    /// Upgrades: buffs, coins and productivity.
    Upg,
    /// Workforce productivity.
    Prod,
}

impl DeckType {
    /// All decks in display order.
    pub const ALL: [DeckType; 4] = [DeckType::Fin, DeckType::Site, DeckType::Upg, DeckType::Prod];

    pub fn name(self) -> &'static str {
        match self {
            DeckType::Fin => "FIN",
            DeckType::Site => "SITE",
            DeckType::Upg => "UPG",
            DeckType::Prod => "PROD",
        }
    }
}

impl std::fmt::Display for DeckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Activities ─────────────────────────────────────────────────────────

/// How an activity relates to the ones before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Dependency {
    #[default]
    #[serde(rename = "NONE")]
    None,
    /// Finish-to-start: every listed activity must be completed first.
    #[serde(rename = "FS")]
    FinishToStart { on: Vec<String> },
    /// Start-to-start: listed activities are expected to run together.
    #[serde(rename = "SS")]
    StartToStart { with: Vec<String> },
}

impl Dependency {
    /// Every activity id this dependency names.
    pub fn referenced_ids(&self) -> &[String] {
        match self {
            Dependency::None => &[],
            Dependency::FinishToStart { on } => on,
            Dependency::StartToStart { with } => with,
        }
    }
}

/// One unit of progression every player completes, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    /// Weeks needed with no modifiers.
    pub base_time: i32,
    /// Budget points needed with no modifiers.
    pub base_cost: i32,
    pub req_workers: u32,
    pub req_machines: u32,
    #[serde(default)]
    pub dep: Dependency,
}

// ── Cards ──────────────────────────────────────────────────────────────

/// A timed buff a card hands to the player who consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffGrant {
    pub effect: BuffEffect,
    pub turns: u32,
}

/// Signed deltas a card applies to the turn it is consumed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEffect {
    #[serde(default)]
    pub time_delta: i32,
    #[serde(default)]
    pub cost_delta: i32,
    #[serde(default)]
    pub prod_delta: i32,
    #[serde(default)]
    pub coin_delta: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buff: Option<BuffGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub deck: DeckType,
    pub title: String,
    pub rules_text: String,
    #[serde(default)]
    pub effect: CardEffect,
}

// ── Errors ─────────────────────────────────────────────────────────────

/// Data-integrity failures while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("activity catalog is empty")]
    Empty,
    #[error("{kind} at position {index} has no identifier")]
    MissingId { kind: &'static str, index: usize },
    #[error("duplicate {kind} identifier {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("activity {activity} depends on unknown activity {missing}")]
    UnknownDependency { activity: String, missing: String },
}

// ── Catalog ────────────────────────────────────────────────────────────

/// Validated, immutable activity sequence plus card set.
#[derive(Debug, Clone)]
pub struct Catalog {
    activities: Vec<Activity>,
    cards: Vec<Card>,
    card_index: HashMap<String, usize>,
}

impl Catalog {
    /// The catalog shipped in `data/`.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(ACTIVITIES_JSON, CARDS_JSON)
    }

    /// Parse both catalogs from JSON arrays and validate them.
    pub fn from_json(activities_json: &str, cards_json: &str) -> Result<Self, CatalogError> {
        let activities: Vec<Activity> = serde_json::from_str(activities_json)?;
        let cards: Vec<Card> = serde_json::from_str(cards_json)?;
        Self::new(activities, cards)
    }

    /// Validate already-parsed catalogs.
    ///
    /// Rejects an empty schedule, blank or duplicate ids, and dependencies
    /// that name activities outside the schedule.
    pub fn new(activities: Vec<Activity>, cards: Vec<Card>) -> Result<Self, CatalogError> {
        if activities.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, activity) in activities.iter().enumerate() {
            if activity.id.trim().is_empty() {
                return Err(CatalogError::MissingId {
                    kind: "activity",
                    index,
                });
            }
            if !seen.insert(activity.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "activity",
                    id: activity.id.clone(),
                });
            }
        }
        for activity in &activities {
            if let Some(missing) = activity
                .dep
                .referenced_ids()
                .iter()
                .find(|id| !seen.contains(id.as_str()))
            {
                return Err(CatalogError::UnknownDependency {
                    activity: activity.id.clone(),
                    missing: missing.clone(),
                });
            }
        }

        let mut card_index = HashMap::with_capacity(cards.len());
        for (index, card) in cards.iter().enumerate() {
            if card.id.trim().is_empty() {
                return Err(CatalogError::MissingId { kind: "card", index });
            }
            if card_index.insert(card.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateId {
                    kind: "card",
                    id: card.id.clone(),
                });
            }
        }

        Ok(Self {
            activities,
            cards,
            card_index,
        })
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Number of activities every player must complete.
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    pub fn activity(&self, index: usize) -> Option<&Activity> {
        self.activities.get(index)
    }

    /// Ids of the activities before `cursor`, i.e. a player's completed set.
    pub fn completed_ids(&self, cursor: usize) -> HashSet<&str> {
        self.activities
            .iter()
            .take(cursor)
            .map(|a| a.id.as_str())
            .collect()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.card_index.get(id).map(|&i| &self.cards[i])
    }

    /// Card ids belonging to one deck, in catalog order.
    pub fn deck_ids(&self, deck: DeckType) -> Vec<String> {
        self.cards
            .iter()
            .filter(|c| c.deck == deck)
            .map(|c| c.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, dep: Dependency) -> Activity {
        Activity {
            id: id.to_string(),
            name: format!("Activity {id}"),
            base_time: 1,
            base_cost: 1,
            req_workers: 0,
            req_machines: 0,
            dep,
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().expect("builtin catalog is valid");
        assert_eq!(catalog.activity_count(), 40);
        assert_eq!(catalog.cards().len(), 60);
        for deck in DeckType::ALL {
            assert_eq!(catalog.deck_ids(deck).len(), 15, "deck {deck}");
        }
    }

    #[test]
    fn test_builtin_dependency_shapes() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.activity(0).unwrap().dep, Dependency::None);
        assert_eq!(
            catalog.activity(2).unwrap().dep,
            Dependency::FinishToStart {
                on: vec!["A01".to_string(), "A02".to_string()]
            }
        );
        let windows = catalog.activities().iter().find(|a| a.id == "A20").unwrap();
        assert_eq!(
            windows.dep,
            Dependency::StartToStart {
                with: vec!["A21".to_string()]
            }
        );
    }

    #[test]
    fn test_card_lookup() {
        let catalog = Catalog::builtin().unwrap();
        let card = catalog.card("U01").unwrap();
        assert_eq!(card.deck, DeckType::Upg);
        assert_eq!(
            card.effect.buff,
            Some(BuffGrant {
                effect: BuffEffect::TimeMinus1,
                turns: 2
            })
        );
        assert!(catalog.card("Z99").is_none());
    }

    #[test]
    fn test_empty_effect_defaults_to_zero() {
        let catalog = Catalog::builtin().unwrap();
        let card = catalog.card("S15").unwrap();
        assert_eq!(card.effect, CardEffect::default());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let err = Catalog::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::Empty));
    }

    #[test]
    fn test_missing_id_rejected() {
        let activities = vec![
            activity("A01", Dependency::None),
            activity(" ", Dependency::None),
        ];
        let err = Catalog::new(activities, vec![]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingId {
                kind: "activity",
                index: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = Catalog::new(
            vec![activity("A01", Dependency::None), activity("A01", Dependency::None)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { .. }));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let err = Catalog::new(
            vec![activity(
                "A01",
                Dependency::FinishToStart {
                    on: vec!["A00".to_string()],
                },
            )],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDependency { .. }));
    }

    #[test]
    fn test_completed_ids_prefix() {
        let catalog = Catalog::builtin().unwrap();
        let done = catalog.completed_ids(3);
        assert_eq!(done.len(), 3);
        assert!(done.contains("A01") && done.contains("A03"));
        assert!(!done.contains("A04"));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = Catalog::from_json("{not json", "[]").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
