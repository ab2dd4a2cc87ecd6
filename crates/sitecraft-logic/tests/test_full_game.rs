//! Integration tests for complete games through the turn state machine.
//!
//! Exercises: lobby → start → roll/apply loop → finish → standings
//!
//! All tests are pure logic with a seeded RNG and no store.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sitecraft_logic::catalog::DeckType;
use sitecraft_logic::game::{GameError, GameState, RoomStatus, TurnChoice};
use sitecraft_logic::{Catalog, GameConfig};

// ── Helpers ────────────────────────────────────────────────────────────

fn lobby(players: usize, seed: u64) -> (GameState, Catalog, StdRng) {
    let catalog = Catalog::builtin().expect("builtin catalog");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = GameState::new("TEST1", "p0", "Host", GameConfig::default(), &catalog, &mut rng);
    for i in 1..players {
        game.add_player(&format!("p{i}"), &format!("Player {i}"))
            .expect("lobby has room");
    }
    (game, catalog, rng)
}

/// Play one turn for whoever is active, paying for the second offered
/// card when affordable and the coin flip says so.
fn play_turn(game: &mut GameState, catalog: &Catalog, rng: &mut StdRng) {
    let id = game.active_player().expect("active player").id.clone();
    let chosen_deck = Some(DeckType::ALL[rng.gen_range(0..4)]);
    let ctx = game
        .roll_and_offer(&id, chosen_deck, catalog, rng)
        .expect("roll")
        .clone();

    let coins = game.player(&id).expect("player").coins;
    let choice = if ctx.offered_card_ids.len() == 2 && coins >= 2 && rng.gen_bool(0.5) {
        TurnChoice::pick(&ctx.offered_card_ids[1], 2)
    } else {
        TurnChoice::top_card()
    };
    game.apply_turn(&id, &choice, catalog, rng).expect("apply");
}

fn play_to_end(game: &mut GameState, catalog: &Catalog, rng: &mut StdRng) -> usize {
    let mut turns = 0;
    while game.status == RoomStatus::Active {
        play_turn(game, catalog, rng);
        turns += 1;
        assert!(turns <= 10_000, "game did not terminate");
    }
    turns
}

// ── Full games ─────────────────────────────────────────────────────────

#[test]
fn test_full_game_terminates_exactly_when_all_done() {
    let (mut game, catalog, mut rng) = lobby(3, 7);
    game.start("p0").unwrap();

    let total = catalog.activity_count();
    while game.status == RoomStatus::Active {
        assert!(!game.is_complete(&catalog));
        play_turn(&mut game, &catalog, &mut rng);
    }
    assert_eq!(game.status, RoomStatus::Finished);
    assert!(game.players.iter().all(|p| p.activity_index == total));
    assert_eq!(game.log.last().map(String::as_str), Some("Game finished."));
    assert!(game.current_turn.is_none());
}

#[test]
fn test_every_player_takes_one_activity_per_round() {
    let (mut game, catalog, mut rng) = lobby(4, 11);
    game.start("p0").unwrap();
    let turns = play_to_end(&mut game, &catalog, &mut rng);
    assert_eq!(turns, 4 * catalog.activity_count());
    assert_eq!(game.round as usize, catalog.activity_count());
}

#[test]
fn test_progress_is_monotonic_and_bounded() {
    let (mut game, catalog, mut rng) = lobby(2, 99);
    game.start("p0").unwrap();
    let total = catalog.activity_count();

    let mut last: Vec<(usize, i32)> = game
        .players
        .iter()
        .map(|p| (p.activity_index, p.time))
        .collect();
    while game.status == RoomStatus::Active {
        play_turn(&mut game, &catalog, &mut rng);
        for (p, (index, time)) in game.players.iter().zip(last.iter_mut()) {
            assert!(p.activity_index >= *index);
            assert!(p.activity_index <= total);
            assert!(p.time >= *time);
            assert!(p.coins >= 0);
            *index = p.activity_index;
            *time = p.time;
        }
    }
}

#[test]
fn test_decks_conserved_through_whole_game() {
    let (mut game, catalog, mut rng) = lobby(5, 2024);
    game.start("p0").unwrap();
    while game.status == RoomStatus::Active {
        play_turn(&mut game, &catalog, &mut rng);
        assert!(game.decks.is_conserved(&catalog));
    }
}

#[test]
fn test_same_seed_same_game() {
    let run = |seed| {
        let (mut game, catalog, mut rng) = lobby(3, seed);
        game.start("p0").unwrap();
        play_to_end(&mut game, &catalog, &mut rng);
        game
    };
    assert_eq!(run(5), run(5));
}

#[test]
fn test_standings_after_finish() {
    let (mut game, catalog, mut rng) = lobby(3, 3);
    game.start("p0").unwrap();
    assert_eq!(game.standings().unwrap_err(), GameError::NotFinished);
    play_to_end(&mut game, &catalog, &mut rng);

    let standings = game.standings().unwrap();
    assert_eq!(standings.len(), 3);
    assert_eq!(standings[0].rank, 1);
    assert!(standings.windows(2).all(|w| w[0].score >= w[1].score));
}

// ── Gating ─────────────────────────────────────────────────────────────

#[test]
fn test_actions_rejected_after_finish() {
    let (mut game, catalog, mut rng) = lobby(2, 8);
    game.start("p0").unwrap();
    play_to_end(&mut game, &catalog, &mut rng);
    let before = game.clone();
    assert_eq!(
        game.roll_and_offer("p0", None, &catalog, &mut rng).unwrap_err(),
        GameError::NotActive
    );
    assert_eq!(
        game.apply_turn("p0", &TurnChoice::top_card(), &catalog, &mut rng)
            .unwrap_err(),
        GameError::NotActive
    );
    assert_eq!(game, before);
}

#[test]
fn test_rejections_leave_state_and_log_untouched() {
    let (mut game, catalog, mut rng) = lobby(2, 13);
    game.start("p0").unwrap();
    let before = game.clone();

    assert_eq!(
        game.apply_turn("p1", &TurnChoice::top_card(), &catalog, &mut rng)
            .unwrap_err(),
        GameError::NotYourTurn
    );
    assert_eq!(
        game.apply_turn("p0", &TurnChoice::top_card(), &catalog, &mut rng)
            .unwrap_err(),
        GameError::RollRequired
    );
    assert_eq!(game, before);

    game.roll_and_offer("p0", None, &catalog, &mut rng).unwrap();
    let rolled = game.clone();
    assert_eq!(
        game.apply_turn("p0", &TurnChoice::pick("NOT-A-CARD", 2), &catalog, &mut rng)
            .unwrap_err(),
        GameError::InvalidCardChoice
    );
    assert_eq!(game, rolled);
}
