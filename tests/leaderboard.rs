//! Leaderboard ordering and the bundled seed file.

use std::path::Path;

use squirrel_catcher::config::GameConfig;
use squirrel_catcher::game::{GameEngine, PlayerRecord};
use squirrel_catcher::storage::seed::{apply_seed, load_seed_file, parse_seed};
use squirrel_catcher::storage::Store;
use tempfile::TempDir;

fn engine() -> (TempDir, GameEngine) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (dir, GameEngine::new(store, GameConfig::default()))
}

#[test]
fn bundled_seed_file_ranks_by_net_worth() {
    let (_dir, engine) = engine();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/seeds/leaderboard.json");
    let seeds = load_seed_file(&path).unwrap();
    assert_eq!(apply_seed(engine.store(), &seeds).unwrap(), seeds.len());

    let board = engine.leaderboard(3).unwrap();
    assert_eq!(board.len(), 3);
    assert_eq!(board[0].label, "NutMaster");
    // 4873 + 37 silver + 2 emerald
    assert_eq!(board[0].total_value, 10_573);
    assert_eq!(board[1].label, "AcornQueen");
    assert_eq!(board[2].rank, 3);
    assert!(board.windows(2).all(|w| w[0].total_value >= w[1].total_value));
}

#[test]
fn ties_fall_back_to_catches_then_user_id() {
    let (_dir, engine) = engine();
    let rows = [("300", 100, 4), ("200", 100, 9), ("100", 100, 9), ("400", 5, 50)];
    for (id, acorns, catches) in rows {
        let mut p = PlayerRecord::new(id);
        p.acorns = acorns;
        p.total_catches = catches;
        engine.store().put_player(&p).unwrap();
    }

    let board = engine.leaderboard(10).unwrap();
    let order: Vec<&str> = board.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(order, vec!["100", "200", "300", "400"]);
    assert_eq!(board[3].label, "User 400");
}

#[test]
fn reseeding_keeps_upgrades_and_names() {
    let (_dir, engine) = engine();
    let mut existing = PlayerRecord::new("42");
    existing.display_name = Some("Hazel".into());
    existing.trap_tier = 3;
    engine.store().put_player(&existing).unwrap();

    let seeds = parse_seed(
        r#"[{"user_id": "42", "display_name": "Imported", "acorns": 900, "level": 6,
             "catches": {"Chipmunk": 12}}]"#,
    )
    .unwrap();
    apply_seed(engine.store(), &seeds).unwrap();

    let player = engine.store().get_player("42").unwrap();
    assert_eq!(player.acorns, 900);
    assert_eq!(player.level, 6);
    assert_eq!(player.catches.get("Chipmunk"), Some(&12));
    assert_eq!(player.trap_tier, 3);
    assert_eq!(player.display_name.as_deref(), Some("Hazel"));
}

#[test]
fn malformed_seed_is_an_error() {
    assert!(parse_seed("{\"user_id\": 1}").is_err());
}
