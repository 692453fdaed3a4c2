use crate::game::types::PlayerRecord;

/// XP needed to advance from `level` to `level + 1`.
pub fn xp_for_level(level: u32) -> u64 {
    (50.0 * (level as f64).powf(1.5)) as u64
}

/// Add XP and roll over as many levels as it pays for. Returns levels gained.
pub fn grant_xp(player: &mut PlayerRecord, amount: u64) -> u32 {
    player.xp = player.xp.saturating_add(amount);
    let mut gained = 0;
    loop {
        let needed = xp_for_level(player.level);
        if player.xp < needed {
            break;
        }
        player.xp -= needed;
        player.level += 1;
        gained += 1;
    }
    gained
}
