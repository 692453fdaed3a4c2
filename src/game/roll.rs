//! Reward rolling: junk threshold first, then a weighted pick over the species
//! catalog, then reward scaling.
//!
//! Everything takes the RNG as a parameter so tests can drive it with a seeded
//! `StdRng`; the engine passes `rand::thread_rng()`.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::game::buffs::Modifiers;
use crate::game::catalog::{Junk, Species, JUNK, SPECIES};
use crate::game::types::PlayerRecord;

/// Junk percentage before any reductions.
pub const JUNK_BASE: u32 = 30;
/// Levels beyond this stop lowering the junk chance.
pub const LEVEL_JUNK_CAP: u32 = 15;
/// Junk chance never drops below this, however many items stack.
pub const JUNK_FLOOR: u32 = 5;
/// Junk points removed per Junk Filter tier.
pub const JUNK_RESIST_PER_TIER: u32 = 2;
/// Rare-tier weight bonus per Sturdy Trap tier.
pub const TRAP_BONUS_PER_TIER: f64 = 0.05;
/// Acorn bonus per Acorn Magnet tier.
pub const MAGNET_BONUS_PER_TIER: f64 = 0.10;

/// The player-derived inputs of a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollContext {
    pub level: u32,
    pub trap_tier: u8,
    pub junk_resist_tier: u8,
    pub acorn_magnet_tier: u8,
}

impl RollContext {
    pub fn for_player(player: &PlayerRecord) -> Self {
        Self {
            level: player.level,
            trap_tier: player.trap_tier,
            junk_resist_tier: player.junk_resist_tier,
            acorn_magnet_tier: player.acorn_magnet_tier,
        }
    }

    pub fn at_level(level: u32) -> Self {
        Self {
            level,
            trap_tier: 0,
            junk_resist_tier: 0,
            acorn_magnet_tier: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RollOutcome {
    Junk(&'static Junk),
    Species {
        species: &'static Species,
        acorns: u64,
    },
}

/// Junk chance in percent.
pub fn junk_chance(ctx: &RollContext, mods: &Modifiers) -> u32 {
    let reduction = ctx.level.min(LEVEL_JUNK_CAP)
        + JUNK_RESIST_PER_TIER * ctx.junk_resist_tier as u32
        + mods.junk_reduction;
    JUNK_BASE.saturating_sub(reduction).max(JUNK_FLOOR)
}

/// Multiplier applied to the weight of every rare-tier species.
pub fn rare_factor(ctx: &RollContext, mods: &Modifiers) -> f64 {
    let level_bonus = (ctx.level as f64 * 0.5).min(10.0);
    let base = 1.0 + level_bonus / 100.0 + TRAP_BONUS_PER_TIER * ctx.trap_tier as f64;
    base * mods.rare_multiplier
}

pub fn species_weights(ctx: &RollContext, mods: &Modifiers) -> Vec<f64> {
    let factor = rare_factor(ctx, mods);
    SPECIES
        .iter()
        .map(|s| {
            if s.rarity.is_rare_tier() {
                s.weight * factor
            } else {
                s.weight
            }
        })
        .collect()
}

/// Scale a raw acorn draw by level, magnet tier and buff multipliers (truncating).
pub fn scale_reward(base: u64, ctx: &RollContext, mods: &Modifiers) -> u64 {
    let level_factor = 1.0 + ctx.level as f64 * 0.02;
    let magnet_factor = 1.0 + MAGNET_BONUS_PER_TIER * ctx.acorn_magnet_tier as f64;
    (base as f64 * level_factor * magnet_factor * mods.acorn_multiplier) as u64
}

pub fn roll_catch<R: Rng + ?Sized>(rng: &mut R, ctx: &RollContext, mods: &Modifiers) -> RollOutcome {
    let draw: u32 = rng.gen_range(1..=100);
    if draw <= junk_chance(ctx, mods) {
        let junk = &JUNK[rng.gen_range(0..JUNK.len())];
        return RollOutcome::Junk(junk);
    }

    let weights = species_weights(ctx, mods);
    let index = WeightedIndex::new(&weights)
        .map(|dist| dist.sample(rng))
        .unwrap_or(0);
    let species = &SPECIES[index];
    let base = rng.gen_range(species.min_acorns..=species.max_acorns);
    RollOutcome::Species {
        species,
        acorns: scale_reward(base, ctx, mods),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn junk_chance_matches_level_curve() {
        let none = Modifiers::default();
        assert_eq!(junk_chance(&RollContext::at_level(1), &none), 29);
        assert_eq!(junk_chance(&RollContext::at_level(10), &none), 20);
        assert_eq!(junk_chance(&RollContext::at_level(15), &none), 15);
        assert_eq!(junk_chance(&RollContext::at_level(80), &none), 15);
    }

    #[test]
    fn junk_chance_items_and_floor() {
        let mut ctx = RollContext::at_level(20);
        ctx.junk_resist_tier = 3;
        let mut mods = Modifiers::default();
        assert_eq!(junk_chance(&ctx, &mods), 9);
        mods.junk_reduction = 10;
        assert_eq!(junk_chance(&ctx, &mods), JUNK_FLOOR);
    }

    #[test]
    fn rare_factor_combines_sources() {
        let mut ctx = RollContext::at_level(4);
        let mut mods = Modifiers::default();
        assert!((rare_factor(&ctx, &mods) - 1.02).abs() < 1e-9);
        ctx.trap_tier = 2;
        mods.rare_multiplier = 1.5;
        assert!((rare_factor(&ctx, &mods) - 1.12 * 1.5).abs() < 1e-9);
        // level bonus caps at 10%
        assert!((rare_factor(&RollContext::at_level(99), &Modifiers::default()) - 1.10).abs() < 1e-9);
    }

    #[test]
    fn common_weights_are_untouched() {
        let mut mods = Modifiers::default();
        mods.rare_multiplier = 3.0;
        let weights = species_weights(&RollContext::at_level(1), &mods);
        for (species, weight) in SPECIES.iter().zip(weights) {
            if species.rarity.is_rare_tier() {
                assert!(weight > species.weight);
            } else {
                assert_eq!(weight, species.weight);
            }
        }
    }

    #[test]
    fn reward_scaling() {
        let none = Modifiers::default();
        assert_eq!(scale_reward(100, &RollContext::at_level(1), &none), 102);
        let mut ctx = RollContext::at_level(10);
        ctx.acorn_magnet_tier = 5;
        let mut doubled = Modifiers::default();
        doubled.acorn_multiplier = 2.0;
        // 100 * 1.2 * 1.5 * 2
        assert_eq!(scale_reward(100, &ctx, &doubled), 360);
    }

    #[test]
    fn rolled_rewards_stay_in_scaled_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let ctx = RollContext::at_level(5);
        let mods = Modifiers::default();
        for _ in 0..500 {
            if let RollOutcome::Species { species, acorns } = roll_catch(&mut rng, &ctx, &mods) {
                assert!(acorns >= scale_reward(species.min_acorns, &ctx, &mods));
                assert!(acorns <= scale_reward(species.max_acorns, &ctx, &mods));
            }
        }
    }
}
