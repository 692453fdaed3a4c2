//! Buff lifetimes and the modifier stack they produce.
//!
//! Charge buffs stack: every active instance contributes and every instance that
//! was actually used loses a charge. Timed buffs are extended on repurchase, so at
//! most one instance per timed kind is ever active.

use chrono::{DateTime, Duration, Utc};

use crate::game::types::{BuffKind, BuffRecord};

/// Minimum manual cooldown regardless of how many speed-ups are stacked.
pub const MIN_COOLDOWN_SECS: i64 = 2;

pub const LUCKY_ACORN_RARE_MULTIPLIER: f64 = 1.5;
pub const DOUBLER_ACORN_MULTIPLIER: f64 = 2.0;
pub const REPELLENT_JUNK_REDUCTION: u32 = 10;
pub const QUICK_TRAP_COOLDOWN_FACTOR: f64 = 0.5;
pub const ELITE_HUNTER_RARE_MULTIPLIER: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffLifetime {
    Charges(u32),
    Timed(Duration),
}

pub fn lifetime(kind: BuffKind) -> BuffLifetime {
    match kind {
        BuffKind::LuckyAcorn => BuffLifetime::Charges(10),
        BuffKind::AcornDoubler => BuffLifetime::Charges(5),
        BuffKind::JunkRepellent => BuffLifetime::Timed(Duration::minutes(30)),
        BuffKind::QuickTrap => BuffLifetime::Timed(Duration::minutes(30)),
        BuffKind::SquirrelHunter => BuffLifetime::Timed(Duration::minutes(60)),
        BuffKind::EliteHunter => BuffLifetime::Timed(Duration::minutes(120)),
    }
}

/// How often the background tick fires a catch for a hunter buff.
pub fn auto_catch_interval(kind: BuffKind) -> Option<Duration> {
    match kind {
        BuffKind::SquirrelHunter => Some(Duration::minutes(5)),
        BuffKind::EliteHunter => Some(Duration::minutes(2)),
        _ => None,
    }
}

/// One-line description used by the shop and the buff list.
pub fn describe(kind: BuffKind) -> String {
    let effect = match kind {
        BuffKind::LuckyAcorn => format!("rare squirrels ×{} more likely", LUCKY_ACORN_RARE_MULTIPLIER),
        BuffKind::AcornDoubler => "double acorns from squirrels".to_string(),
        BuffKind::JunkRepellent => format!("-{}% junk chance", REPELLENT_JUNK_REDUCTION),
        BuffKind::QuickTrap => "trap recharges twice as fast".to_string(),
        BuffKind::SquirrelHunter => "auto-catch every 5 min".to_string(),
        BuffKind::EliteHunter => format!(
            "auto-catch every 2 min, rare ×{}",
            ELITE_HUNTER_RARE_MULTIPLIER
        ),
    };
    match lifetime(kind) {
        BuffLifetime::Charges(n) => format!("{} ({} catches)", effect, n),
        BuffLifetime::Timed(d) => format!("{} ({} min)", effect, d.num_minutes()),
    }
}

/// True when the hunter buff should fire at `now`.
pub fn is_auto_catch_due(buff: &BuffRecord, now: DateTime<Utc>) -> bool {
    let Some(interval) = auto_catch_interval(buff.kind) else {
        return false;
    };
    if !buff.is_active(now) {
        return false;
    }
    match buff.last_triggered {
        None => true,
        Some(last) => now.signed_duration_since(last) >= interval,
    }
}

/// Aggregated effect of every active buff for one roll.
#[derive(Debug, Clone, PartialEq)]
pub struct Modifiers {
    pub rare_multiplier: f64,
    pub acorn_multiplier: f64,
    pub junk_reduction: u32,
    pub cooldown_factor: f64,
    /// Charge buffs that contributed to `rare_multiplier`.
    pub rare_charge_ids: Vec<u64>,
    /// Charge buffs that contributed to `acorn_multiplier`.
    pub acorn_charge_ids: Vec<u64>,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            rare_multiplier: 1.0,
            acorn_multiplier: 1.0,
            junk_reduction: 0,
            cooldown_factor: 1.0,
            rare_charge_ids: Vec::new(),
            acorn_charge_ids: Vec::new(),
        }
    }
}

impl Modifiers {
    /// Modifiers for a manual catch: every active buff applies.
    pub fn from_buffs(buffs: &[BuffRecord], now: DateTime<Utc>) -> Self {
        let mut mods = Modifiers::default();
        for buff in buffs.iter().filter(|b| b.is_active(now)) {
            match buff.kind {
                BuffKind::LuckyAcorn => {
                    mods.rare_multiplier *= LUCKY_ACORN_RARE_MULTIPLIER;
                    mods.rare_charge_ids.push(buff.id);
                }
                BuffKind::AcornDoubler => {
                    mods.acorn_multiplier *= DOUBLER_ACORN_MULTIPLIER;
                    mods.acorn_charge_ids.push(buff.id);
                }
                BuffKind::JunkRepellent => mods.junk_reduction += REPELLENT_JUNK_REDUCTION,
                BuffKind::QuickTrap => mods.cooldown_factor *= QUICK_TRAP_COOLDOWN_FACTOR,
                BuffKind::SquirrelHunter | BuffKind::EliteHunter => {}
            }
        }
        mods
    }

    /// Modifiers for a background catch fired by `hunter`. Charge buffs are
    /// left untouched so they are saved for the player's own catches.
    pub fn for_auto_catch(buffs: &[BuffRecord], hunter: BuffKind, now: DateTime<Utc>) -> Self {
        let timed: Vec<BuffRecord> = buffs
            .iter()
            .filter(|b| matches!(lifetime(b.kind), BuffLifetime::Timed(_)))
            .cloned()
            .collect();
        let mut mods = Self::from_buffs(&timed, now);
        if hunter == BuffKind::EliteHunter {
            mods.rare_multiplier *= ELITE_HUNTER_RARE_MULTIPLIER;
        }
        mods
    }

    /// Manual catch cooldown after speed-ups, floored at [`MIN_COOLDOWN_SECS`].
    pub fn effective_cooldown(&self, base: Duration) -> Duration {
        let scaled_ms = (base.num_milliseconds() as f64 * self.cooldown_factor) as i64;
        Duration::milliseconds(scaled_ms).max(Duration::seconds(MIN_COOLDOWN_SECS))
    }
}
