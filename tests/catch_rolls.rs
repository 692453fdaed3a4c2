//! Statistical checks on the catch roll, driven by seeded RNGs.

use rand::rngs::StdRng;
use rand::SeedableRng;
use squirrel_catcher::game::roll::{junk_chance, scale_reward, JUNK_FLOOR};
use squirrel_catcher::game::{roll_catch, Modifiers, RollContext, RollOutcome};

const ROLLS: usize = 20_000;

fn junk_share(ctx: &RollContext, mods: &Modifiers, seed: u64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let junk = (0..ROLLS)
        .filter(|_| matches!(roll_catch(&mut rng, ctx, mods), RollOutcome::Junk(_)))
        .count();
    junk as f64 / ROLLS as f64
}

fn rare_share(ctx: &RollContext, mods: &Modifiers, seed: u64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut species = 0usize;
    let mut rare = 0usize;
    for _ in 0..ROLLS {
        if let RollOutcome::Species { species: s, .. } = roll_catch(&mut rng, ctx, mods) {
            species += 1;
            if s.rarity.is_rare_tier() {
                rare += 1;
            }
        }
    }
    rare as f64 / species as f64
}

#[test]
fn new_player_junk_rate_tracks_threshold() {
    let ctx = RollContext::at_level(1);
    let mods = Modifiers::default();
    assert_eq!(junk_chance(&ctx, &mods), 29);
    let share = junk_share(&ctx, &mods, 7);
    assert!((0.26..0.32).contains(&share), "junk share {}", share);
}

#[test]
fn stacked_reductions_stop_at_floor() {
    let mut ctx = RollContext::at_level(40);
    ctx.junk_resist_tier = 5;
    let mods = Modifiers {
        junk_reduction: 20,
        ..Modifiers::default()
    };
    assert_eq!(junk_chance(&ctx, &mods), JUNK_FLOOR);
    let share = junk_share(&ctx, &mods, 11);
    assert!((0.035..0.065).contains(&share), "junk share {}", share);
}

#[test]
fn lucky_multiplier_shifts_toward_rare_tiers() {
    let ctx = RollContext::at_level(1);
    let plain = rare_share(&ctx, &Modifiers::default(), 3);
    let lucky = rare_share(
        &ctx,
        &Modifiers {
            rare_multiplier: 1.5,
            ..Modifiers::default()
        },
        3,
    );
    assert!(lucky > plain + 0.02, "plain {} lucky {}", plain, lucky);
}

#[test]
fn species_rewards_stay_inside_scaled_range() {
    let mut ctx = RollContext::at_level(12);
    ctx.acorn_magnet_tier = 3;
    let mods = Modifiers {
        acorn_multiplier: 2.0,
        ..Modifiers::default()
    };
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..5_000 {
        if let RollOutcome::Species { species, acorns } = roll_catch(&mut rng, &ctx, &mods) {
            let low = scale_reward(species.min_acorns, &ctx, &mods);
            let high = scale_reward(species.max_acorns, &ctx, &mods);
            assert!(
                (low..=high).contains(&acorns),
                "{} paid {} outside {}..={}",
                species.name,
                acorns,
                low,
                high
            );
        }
    }
}
