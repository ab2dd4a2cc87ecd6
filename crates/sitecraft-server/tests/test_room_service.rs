//! Integration tests for the room service over real stores.
//!
//! Exercises: create → join → start → roll/apply loop → finish → standings,
//! persisted through the file store and the in-memory registry.

use std::path::PathBuf;

use sitecraft_logic::game::{GameError, TurnChoice};
use sitecraft_logic::RoomStatus;
use sitecraft_server::{GameService, RoomStore, ServerConfig, ServiceError};

// ── Helpers ────────────────────────────────────────────────────────────

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("sitecraft_service_tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn config(seed: u64) -> ServerConfig {
    ServerConfig {
        seed: Some(seed),
        ..ServerConfig::default()
    }
}

/// Play until finished, always taking the top card. Returns the turn count.
fn play_out<S: RoomStore>(svc: &mut GameService<S>, code: &str) -> usize {
    let mut turns = 0;
    loop {
        let view = svc.room(code).expect("room");
        if view.room.status != RoomStatus::Active {
            return turns;
        }
        let id = view.room.active_player().expect("active").id.clone();
        svc.roll_and_offer(&id, None).expect("roll");
        svc.apply_turn(&id, &TurnChoice::top_card()).expect("apply");
        turns += 1;
        assert!(turns < 1_000, "game did not finish");
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_full_game_in_memory() {
    let mut svc = GameService::in_memory(config(21)).unwrap();
    let host_view = svc.create_room("Ada").unwrap();
    let host = host_view.player_id.unwrap();
    let code = host_view.room.room_code;
    svc.join_room(&code, "Bob").unwrap();
    svc.join_room(&code, "Cy").unwrap();
    svc.start_game(&host).unwrap();

    let turns = play_out(&mut svc, &code);
    assert_eq!(turns, 3 * svc.catalog().activity_count());

    let view = svc.room(&code).unwrap();
    assert_eq!(view.room.status, RoomStatus::Finished);
    assert_eq!(view.standings.as_ref().map(Vec::len), Some(3));
    assert_eq!(svc.standings(&code).unwrap().len(), 3);
}

#[test]
fn test_full_game_through_file_store() {
    let dir = temp_dir("full_game");
    let mut svc = GameService::file_backed(ServerConfig {
        data_dir: Some(dir.clone()),
        ..config(8)
    })
    .unwrap();
    let host_view = svc.create_room("Ada").unwrap();
    let host = host_view.player_id.unwrap();
    let code = host_view.room.room_code;
    svc.join_room(&code, "Bob").unwrap();
    svc.start_game(&host).unwrap();

    assert!(dir.join(format!("{code}.json")).exists());
    play_out(&mut svc, &code);
    assert_eq!(svc.room(&code).unwrap().room.status, RoomStatus::Finished);
    assert!(svc.store().fallback().is_empty());
}

#[test]
fn test_join_after_start_rejected() {
    let mut svc = GameService::in_memory(config(3)).unwrap();
    let host_view = svc.create_room("Ada").unwrap();
    let host = host_view.player_id.unwrap();
    let code = host_view.room.room_code;
    svc.join_room(&code, "Bob").unwrap();
    svc.start_game(&host).unwrap();

    let err = svc.join_room(&code, "Late").unwrap_err();
    assert!(matches!(err, ServiceError::Game(GameError::AlreadyStarted)));
    assert_eq!(err.to_string(), "Game already started.");
}

#[test]
fn test_only_host_starts() {
    let mut svc = GameService::in_memory(config(4)).unwrap();
    let code = svc.create_room("Ada").unwrap().room.room_code;
    let guest = svc.join_room(&code, "Bob").unwrap().player_id.unwrap();
    let err = svc.start_game(&guest).unwrap_err();
    assert_eq!(err.to_string(), "Only host can start.");
}

#[test]
fn test_turn_gating_through_service() {
    let mut svc = GameService::in_memory(config(5)).unwrap();
    let host_view = svc.create_room("Ada").unwrap();
    let host = host_view.player_id.unwrap();
    let code = host_view.room.room_code;
    let guest = svc.join_room(&code, "Bob").unwrap().player_id.unwrap();
    svc.start_game(&host).unwrap();

    assert_eq!(
        svc.roll_and_offer(&guest, None).unwrap_err().to_string(),
        "Not your turn."
    );
    assert_eq!(
        svc.apply_turn(&host, &TurnChoice::top_card())
            .unwrap_err()
            .to_string(),
        "Roll first."
    );
    let before = svc.room(&code).unwrap().room;
    svc.roll_and_offer(&host, None).unwrap();
    let err = svc
        .apply_turn(&host, &TurnChoice::pick("NOPE", 2))
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid chosen card.");
    // Only the roll changed the stored room
    let after = svc.room(&code).unwrap().room;
    assert_eq!(after.players, before.players);
    assert_eq!(after.log, before.log);
}

#[test]
fn test_standings_before_finish_rejected() {
    let mut svc = GameService::in_memory(config(6)).unwrap();
    let code = svc.create_room("Ada").unwrap().room.room_code;
    let err = svc.standings(&code).unwrap_err();
    assert_eq!(err.to_string(), "Game not finished.");
}
