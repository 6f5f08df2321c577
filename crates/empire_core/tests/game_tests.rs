//! Whole-game determinism and persistence tests.

use empire_core::prelude::*;
use empire_test_utils::determinism::{
    find_first_divergence, verify_determinism, verify_save_determinism,
};
use empire_test_utils::fixtures::small_config;

#[test]
fn seeded_games_play_identically() {
    let result = verify_determinism(
        3,
        15,
        || Game::new(small_config(), 7).unwrap(),
        |game| {
            game.play_round().unwrap();
        },
        Game::state_hash,
    );
    result.assert_deterministic();
}

#[test]
fn different_seeds_diverge() {
    let a = Game::new(small_config(), 1).unwrap();
    let b = Game::new(small_config(), 2).unwrap();
    assert_ne!(a.state_hash(), b.state_hash());
}

#[test]
fn no_divergence_round_by_round() {
    assert_eq!(
        find_first_divergence(|| Game::new(small_config(), 13).unwrap(), 20),
        None
    );
}

#[test]
fn restored_game_continues_identically() {
    let game = Game::new(small_config(), 17).unwrap();
    assert!(verify_save_determinism(game, 8, 8));
}

#[test]
fn save_file_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empire.sav");

    let mut game = Game::new(small_config(), 5).unwrap();
    for _ in 0..4 {
        game.play_round().unwrap();
    }
    game.save(&path).unwrap();
    let loaded = Game::load(&path).unwrap();

    assert_eq!(loaded.state_hash(), game.state_hash());
    assert_eq!(loaded.date(), game.date());
    assert_eq!(loaded.seed(), 5);
}

#[test]
fn loading_garbage_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.sav");
    std::fs::write(&path, b"not a saved game").unwrap();
    assert!(Game::load(&path).is_err());
    assert!(Game::load(dir.path().join("missing.sav")).is_err());
}

#[test]
fn config_ron_round_trip() {
    let config = small_config();
    let text = config.to_ron_string().unwrap();
    assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
}
