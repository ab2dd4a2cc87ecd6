//! SiteCraft Headless Game Harness
//!
//! Plays complete games in-process through the room service and validates
//! the engine's invariants: catalog integrity, dice fairness, deck
//! conservation, turn gating, monotonic progress, and termination.
//! Runs entirely in-process with no sockets and no UI.
//!
//! Usage:
//!   cargo run -p sitecraft-simtest
//!   cargo run -p sitecraft-simtest -- --verbose

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sitecraft_logic::catalog::{Activity, Catalog, Dependency, DeckType};
use sitecraft_logic::deck::Deck;
use sitecraft_logic::dice::{roll_dice, CardType};
use sitecraft_logic::game::TurnChoice;
use sitecraft_logic::modifiers::{resolve_execution, CardApplication};
use sitecraft_logic::{GameConfig, PlayerState, RoomStatus};
use sitecraft_server::snapshot;
use sitecraft_server::{GameService, RoomRegistry, ServerConfig};

// ── Catalog data (same JSON the engine embeds) ──────────────────────────
const ACTIVITIES_JSON: &str = include_str!("../../../data/activities.json");
const CARDS_JSON: &str = include_str!("../../../data/cards.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== SiteCraft Game Harness ===\n");

    let catalog = match Catalog::from_json(ACTIVITIES_JSON, CARDS_JSON) {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ catalog_load: {}", e);
            println!("\n=== RESULT: 0/1 passed, 1 failed ===");
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Catalog integrity
    results.extend(validate_catalog(&catalog, verbose));

    // 2. Dice fairness
    results.extend(validate_dice(verbose));

    // 3. Deck conservation under random draw sequences
    results.extend(validate_decks(verbose));

    // 4. Modifier pipeline worked examples
    results.extend(validate_modifiers(verbose));

    // 5. Turn gating through the service
    results.extend(validate_turn_gating(verbose));

    // 6. Full seeded games
    results.extend(validate_full_games(&catalog, verbose));

    // 7. Stored-shape normalization
    results.extend(validate_snapshots(&catalog, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &Catalog, verbose: bool) -> Vec<TestResult> {
    println!("--- Catalog ---");
    let mut results = Vec::new();

    results.push(TestResult {
        name: "catalog_activity_count".into(),
        passed: catalog.activity_count() == 40,
        detail: format!("{} activities loaded", catalog.activity_count()),
    });

    let sizes: Vec<(DeckType, usize)> = DeckType::ALL
        .iter()
        .map(|&d| (d, catalog.deck_ids(d).len()))
        .collect();
    results.push(TestResult {
        name: "catalog_deck_sizes".into(),
        passed: sizes.iter().all(|(_, n)| *n == 15),
        detail: format!("{:?}", sizes),
    });

    // FS prerequisites must come earlier in the schedule
    let mut seen = HashSet::new();
    let mut late = Vec::new();
    for a in catalog.activities() {
        if let Dependency::FinishToStart { on } = &a.dep {
            for id in on {
                if !seen.contains(id.as_str()) {
                    late.push(format!("{}→{}", a.id, id));
                }
            }
        }
        seen.insert(a.id.as_str());
    }
    results.push(TestResult {
        name: "catalog_fs_order".into(),
        passed: late.is_empty(),
        detail: if late.is_empty() {
            "all FS prerequisites precede their activity".into()
        } else {
            format!("out of order: {}", late.join(", "))
        },
    });

    let bad_values: Vec<_> = catalog
        .activities()
        .iter()
        .filter(|a| a.base_time <= 0 || a.base_cost < 0)
        .map(|a| a.id.clone())
        .collect();
    results.push(TestResult {
        name: "catalog_positive_values".into(),
        passed: bad_values.is_empty(),
        detail: if bad_values.is_empty() {
            "all activities take time and non-negative budget".into()
        } else {
            format!("bad: {}", bad_values.join(", "))
        },
    });

    if verbose {
        let fs = catalog
            .activities()
            .iter()
            .filter(|a| matches!(a.dep, Dependency::FinishToStart { .. }))
            .count();
        let ss = catalog
            .activities()
            .iter()
            .filter(|a| matches!(a.dep, Dependency::StartToStart { .. }))
            .count();
        println!("  Dependencies: {} FS, {} SS", fs, ss);
    }

    results
}

// ── 2. Dice ─────────────────────────────────────────────────────────────

fn validate_dice(verbose: bool) -> Vec<TestResult> {
    println!("--- Dice ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(60_000);

    let n = 60_000;
    let mut counts = [0u32; 6];
    let mut mapping_ok = true;
    for _ in 0..n {
        let outcome = roll_dice(&mut rng);
        counts[usize::from(outcome.face) - 1] += 1;
        mapping_ok &= CardType::for_face(outcome.face) == Some(outcome.card_type);
    }
    let expected = n as f64 / 6.0;
    let worst = counts
        .iter()
        .map(|&c| (c as f64 - expected).abs() / expected)
        .fold(0.0, f64::max);

    results.push(TestResult {
        name: "dice_fairness".into(),
        passed: worst < 0.03,
        detail: format!("worst face deviation {:.2}% over {} rolls", worst * 100.0, n),
    });
    results.push(TestResult {
        name: "dice_mapping".into(),
        passed: mapping_ok,
        detail: "every face maps through the fixed table".into(),
    });

    if verbose {
        println!("  Face counts: {:?}", counts);
    }

    results
}

// ── 3. Decks ────────────────────────────────────────────────────────────

fn validate_decks(_verbose: bool) -> Vec<TestResult> {
    println!("--- Decks ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(2024);

    let ids: Vec<String> = (1..=15).map(|i| format!("C{:02}", i)).collect();
    let mut full = ids.clone();
    full.sort();

    let mut deck = Deck::shuffled(ids, &mut rng);
    let mut violations = 0;
    let mut peeks_moved = 0;
    for _ in 0..5_000 {
        let before = deck.clone();
        let offer = deck.draw_top(2, &mut rng);
        // A peek may reshuffle but never moves cards to discard
        if deck.discard.len() > before.discard.len() {
            peeks_moved += 1;
        }
        match rng.gen_range(0..3) {
            0 => {
                deck.pop_top(&mut rng);
            }
            1 => {
                if let Some(id) = offer.get(1) {
                    deck.take(id);
                }
            }
            _ => {}
        }
        if deck.all_ids() != full {
            violations += 1;
        }
    }

    results.push(TestResult {
        name: "deck_conservation".into(),
        passed: violations == 0,
        detail: format!("{} violations over 5000 draws", violations),
    });
    results.push(TestResult {
        name: "deck_peek_is_pure".into(),
        passed: peeks_moved == 0,
        detail: format!("{} peeks moved cards", peeks_moved),
    });

    results
}

// ── 4. Modifiers ────────────────────────────────────────────────────────

fn validate_modifiers(_verbose: bool) -> Vec<TestResult> {
    println!("--- Modifier Pipeline ---");
    let mut results = Vec::new();

    let activity = Activity {
        id: "EX1".into(),
        name: "Example".into(),
        base_time: 2,
        base_cost: 5,
        req_workers: 3,
        req_machines: 0,
        dep: Dependency::None,
    };
    let card = sitecraft_logic::catalog::Card {
        id: "EXC".into(),
        deck: DeckType::Site,
        title: "Good weather".into(),
        rules_text: "-1 week".into(),
        effect: sitecraft_logic::catalog::CardEffect {
            time_delta: -1,
            ..Default::default()
        },
    };

    let mut player = PlayerState::new("p", "Example", &GameConfig::default());
    player.workers = 3;
    player.machines = 1;
    let app = CardApplication::from_card(&card, &player.buffs);
    let exec = resolve_execution(&activity, &player, &HashSet::new(), app.clone());
    results.push(TestResult {
        name: "modifier_clean_example".into(),
        passed: exec.actual_time == 1 && exec.actual_cost == 5 && exec.clean,
        detail: format!(
            "time={} cost={} clean={}",
            exec.actual_time, exec.actual_cost, exec.clean
        ),
    });

    player.workers = 1;
    let exec = resolve_execution(&activity, &player, &HashSet::new(), app);
    results.push(TestResult {
        name: "modifier_shortage_example".into(),
        passed: exec.actual_time == 2 && exec.actual_cost == 5 && !exec.clean,
        detail: format!(
            "time={} cost={} clean={}",
            exec.actual_time, exec.actual_cost, exec.clean
        ),
    });

    results
}

// ── 5. Turn gating ──────────────────────────────────────────────────────

fn new_service(seed: u64) -> Option<GameService<RoomRegistry>> {
    GameService::in_memory(ServerConfig {
        seed: Some(seed),
        ..ServerConfig::default()
    })
    .ok()
}

/// A started two-player room: (host id, guest id, room code).
fn start_room(svc: &mut GameService<RoomRegistry>) -> Option<(String, String, String)> {
    let host_view = svc.create_room("Host").ok()?;
    let host = host_view.player_id?;
    let code = host_view.room.room_code;
    let guest = svc.join_room(&code, "Guest").ok()?.player_id?;
    svc.start_game(&host).ok()?;
    Some((host, guest, code))
}

fn validate_turn_gating(_verbose: bool) -> Vec<TestResult> {
    println!("--- Turn Gating ---");
    let mut results = Vec::new();

    let Some(mut svc) = new_service(1) else {
        results.push(TestResult {
            name: "gating_service".into(),
            passed: false,
            detail: "service failed to start".into(),
        });
        return results;
    };

    let Some((host, guest, code)) = start_room(&mut svc) else {
        results.push(TestResult {
            name: "gating_setup".into(),
            passed: false,
            detail: "could not create and start a room".into(),
        });
        return results;
    };

    let current = |svc: &mut GameService<RoomRegistry>| svc.room(&code).ok().map(|v| v.room);

    let before = current(&mut svc);
    let err = svc.apply_turn(&host, &TurnChoice::top_card()).err();
    results.push(TestResult {
        name: "gating_roll_required".into(),
        passed: err.map(|e| e.to_string()) == Some("Roll first.".into())
            && current(&mut svc) == before,
        detail: "apply before roll is refused and mutates nothing".into(),
    });

    let err = svc.roll_and_offer(&guest, None).err();
    results.push(TestResult {
        name: "gating_not_your_turn".into(),
        passed: err.map(|e| e.to_string()) == Some("Not your turn.".into()),
        detail: "guest cannot roll on host's turn".into(),
    });

    let rolled = svc.roll_and_offer(&host, None).is_ok();
    let before = current(&mut svc);
    let err = svc.apply_turn(&host, &TurnChoice::pick("NOT-OFFERED", 2)).err();
    results.push(TestResult {
        name: "gating_invalid_choice".into(),
        passed: rolled
            && err.map(|e| e.to_string()) == Some("Invalid chosen card.".into())
            && current(&mut svc) == before,
        detail: "paid pick of an unoffered card is refused and mutates nothing".into(),
    });

    results
}

// ── 6. Full games ───────────────────────────────────────────────────────

/// Property counters for one played game.
#[derive(Default)]
struct GameReport {
    turns: usize,
    regressions: usize,
    early_finish: usize,
    conservation: usize,
    negative_coins: usize,
    finished: bool,
    all_done: bool,
    standings_sorted: bool,
}

fn play_game(catalog: &Catalog, seed: u64, players: usize) -> Option<GameReport> {
    let mut svc = new_service(seed)?;
    let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
    let host_view = svc.create_room("P0").ok()?;
    let host = host_view.player_id?;
    let code = host_view.room.room_code;
    for i in 1..players {
        svc.join_room(&code, &format!("P{}", i)).ok()?;
    }
    svc.start_game(&host).ok()?;

    let total = catalog.activity_count();
    let mut report = GameReport::default();
    let mut state = svc.room(&code).ok()?.room;

    while state.status == RoomStatus::Active && report.turns < 10_000 {
        if state.players.iter().all(|p| p.is_done(total)) {
            report.early_finish += 1;
        }
        let id = state.active_player()?.id.clone();
        let deck = DeckType::ALL[rng.gen_range(0..4)];
        let view = svc.roll_and_offer(&id, Some(deck)).ok()?;

        let coins = view.room.player(&id)?.coins;
        let choice = match view.offered_cards.get(1) {
            Some(card) if coins >= 2 && rng.gen_bool(0.4) => TurnChoice::pick(&card.id, 2),
            _ => TurnChoice::top_card(),
        };
        let next = svc.apply_turn(&id, &choice).ok()?.room;

        for (old, new) in state.players.iter().zip(&next.players) {
            if new.activity_index < old.activity_index
                || new.time < old.time
                || new.activity_index > total
            {
                report.regressions += 1;
            }
            if new.coins < 0 {
                report.negative_coins += 1;
            }
        }
        if !next.decks.is_conserved(catalog) {
            report.conservation += 1;
        }
        state = next;
        report.turns += 1;
    }

    report.finished = state.status == RoomStatus::Finished;
    report.all_done = state.players.iter().all(|p| p.activity_index == total);
    report.standings_sorted = svc
        .standings(&code)
        .map(|s| s.windows(2).all(|w| w[0].score >= w[1].score))
        .unwrap_or(false);
    Some(report)
}

fn validate_full_games(catalog: &Catalog, verbose: bool) -> Vec<TestResult> {
    println!("--- Full Games ---");
    let mut results = Vec::new();

    let mut games = 0;
    let mut failures = Vec::new();
    let mut totals = GameReport::default();
    for players in 2..=6 {
        for seed in 0..10u64 {
            games += 1;
            match play_game(catalog, seed * 31 + players as u64, players) {
                Some(report) => {
                    let expected_turns = players * catalog.activity_count();
                    if report.turns != expected_turns || !report.finished || !report.all_done {
                        failures.push(format!(
                            "{}p/seed {}: {} turns",
                            players, seed, report.turns
                        ));
                    }
                    totals.turns += report.turns;
                    totals.regressions += report.regressions;
                    totals.early_finish += report.early_finish;
                    totals.conservation += report.conservation;
                    totals.negative_coins += report.negative_coins;
                    if !report.standings_sorted {
                        failures.push(format!("{}p/seed {}: standings unsorted", players, seed));
                    }
                }
                None => failures.push(format!("{}p/seed {}: action refused", players, seed)),
            }
        }
    }

    results.push(TestResult {
        name: "games_terminate".into(),
        passed: failures.is_empty() && totals.early_finish == 0,
        detail: if failures.is_empty() {
            format!("{} games, {} turns, all finished exactly on completion", games, totals.turns)
        } else {
            failures.join("; ")
        },
    });
    results.push(TestResult {
        name: "games_monotonic_progress".into(),
        passed: totals.regressions == 0 && totals.negative_coins == 0,
        detail: format!(
            "{} regressions, {} negative coin balances",
            totals.regressions, totals.negative_coins
        ),
    });
    results.push(TestResult {
        name: "games_deck_conservation".into(),
        passed: totals.conservation == 0,
        detail: format!("{} turns broke deck conservation", totals.conservation),
    });

    if verbose {
        println!("  Played {} games ({} turns)", games, totals.turns);
    }

    results
}

// ── 7. Snapshots ────────────────────────────────────────────────────────

fn validate_snapshots(catalog: &Catalog, _verbose: bool) -> Vec<TestResult> {
    println!("--- Snapshots ---");
    let mut results = Vec::new();

    let mut rng = StdRng::seed_from_u64(77);
    let state = sitecraft_logic::GameState::new(
        "SNAP1",
        "p0",
        "Host",
        GameConfig::default(),
        catalog,
        &mut rng,
    );

    let decoded = snapshot::encode(&state, catalog)
        .ok()
        .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
        .map(|mut doc| {
            // Re-key the stored schedule as an object, as older rooms did
            let as_object: serde_json::Map<String, serde_json::Value> = doc["activities"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (i.to_string(), v.clone()))
                        .collect()
                })
                .unwrap_or_default();
            let keyed = serde_json::Value::Object(as_object.clone());
            let normalized = snapshot::normalize_activities(Some(&keyed));
            doc["activities"] = serde_json::Value::Object(as_object);
            (normalized, snapshot::decode(&doc.to_string(), catalog).ok())
        });

    let (normalized, restored) = decoded.unwrap_or_default();
    results.push(TestResult {
        name: "snapshot_object_shape".into(),
        passed: normalized == catalog.activities(),
        detail: format!("{} activities normalized from object keys", normalized.len()),
    });
    results.push(TestResult {
        name: "snapshot_roundtrip".into(),
        passed: restored.as_ref() == Some(&state),
        detail: "stored room decodes to the same state".into(),
    });

    results
}
