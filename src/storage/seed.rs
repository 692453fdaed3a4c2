//! Leaderboard seed loader.
//!
//! Reads a JSON list of players (see `data/seeds/leaderboard.json`) and upserts
//! them. Existing rows keep their upgrade tiers, daily timestamp and display name;
//! everything listed in the seed is overwritten.

use std::collections::HashMap;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::game::errors::GameError;
use crate::game::types::PlayerRecord;
use crate::storage::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPlayer {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub acorns: u64,
    #[serde(default)]
    pub silver_acorns: u64,
    #[serde(default)]
    pub emerald_acorns: u64,
    #[serde(default)]
    pub golden_acorns: u64,
    #[serde(default)]
    pub total_catches: u64,
    #[serde(default)]
    pub junk_catches: u64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub catches: HashMap<String, u64>,
}

fn default_level() -> u32 {
    1
}

pub fn parse_seed(json: &str) -> Result<Vec<SeedPlayer>, GameError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_seed_file<P: AsRef<Path>>(path: P) -> Result<Vec<SeedPlayer>, GameError> {
    let content = std::fs::read_to_string(path)?;
    parse_seed(&content)
}

/// Upsert every seed player. Returns the number written.
pub fn apply_seed(store: &Store, seeds: &[SeedPlayer]) -> Result<usize, GameError> {
    for seed in seeds {
        let mut player = store
            .find_player(&seed.user_id)?
            .unwrap_or_else(|| PlayerRecord::new(&seed.user_id));
        player.acorns = seed.acorns;
        player.silver_acorns = seed.silver_acorns;
        player.emerald_acorns = seed.emerald_acorns;
        player.golden_acorns = seed.golden_acorns;
        player.total_catches = seed.total_catches;
        player.junk_catches = seed.junk_catches;
        player.level = seed.level.max(1);
        player.xp = seed.xp;
        player.catches = seed.catches.clone();
        if player.display_name.is_none() {
            player.display_name = seed.display_name.clone();
        }
        store.put_player(&player)?;
        info!(
            "Seeded user {}: Lvl {}, {} catches",
            seed.user_id, player.level, player.total_catches
        );
    }
    Ok(seeds.len())
}
