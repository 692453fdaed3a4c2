//! Engine-level tests for purchases, buff stacking and charge consumption.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use squirrel_catcher::config::GameConfig;
use squirrel_catcher::game::roll::scale_reward;
use squirrel_catcher::game::{
    BuffKind, CurrencyTier, GameEngine, GameError, Modifiers, PurchaseReport, RollContext,
    RollOutcome, UpgradeLadder,
};
use squirrel_catcher::storage::Store;
use tempfile::TempDir;

fn engine() -> (TempDir, GameEngine) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (dir, GameEngine::new(store, GameConfig::default()))
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn fund(engine: &GameEngine, user: &str, tier: CurrencyTier, amount: u64) {
    let mut player = engine.player(user, None).unwrap();
    *player.balance_mut(tier) = amount;
    engine.store().put_player(&player).unwrap();
}

#[test]
fn charge_buffs_stack_as_separate_instances() {
    let (_dir, engine) = engine();
    fund(&engine, "7", CurrencyTier::Silver, 10);

    for _ in 0..2 {
        let report = engine.buy("7", None, "lucky acorn", None, t0()).unwrap();
        assert!(matches!(
            report,
            PurchaseReport::Charges {
                kind: BuffKind::LuckyAcorn,
                charges: 10,
                ..
            }
        ));
    }

    let active = engine.active_buffs("7", t0()).unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|b| b.charges_left == Some(10)));
    assert_eq!(engine.player("7", None).unwrap().silver_acorns, 6);
}

#[test]
fn timed_buff_repurchase_extends_expiry() {
    let (_dir, engine) = engine();
    fund(&engine, "7", CurrencyTier::Silver, 2);

    let first = engine.buy("7", None, "junk_repellent", None, t0()).unwrap();
    let later = t0() + Duration::minutes(10);
    let second = engine.buy("7", None, "Junk Repellent", None, later).unwrap();

    assert_eq!(
        first,
        PurchaseReport::Timed {
            kind: BuffKind::JunkRepellent,
            price: squirrel_catcher::game::shop::buff_price(BuffKind::JunkRepellent),
            expires_at: t0() + Duration::minutes(30),
            extended: false,
        }
    );
    match second {
        PurchaseReport::Timed {
            expires_at,
            extended,
            ..
        } => {
            assert!(extended);
            assert_eq!(expires_at, t0() + Duration::minutes(60));
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert_eq!(engine.active_buffs("7", later).unwrap().len(), 1);
}

#[test]
fn short_balance_leaves_player_untouched() {
    let (_dir, engine) = engine();
    fund(&engine, "7", CurrencyTier::Silver, 1);

    let err = engine.buy("7", None, "acorn_doubler", None, t0()).unwrap_err();
    assert!(matches!(
        err,
        GameError::InsufficientFunds {
            tier: CurrencyTier::Silver,
            have: 1,
            need: 3
        }
    ));
    assert_eq!(engine.player("7", None).unwrap().silver_acorns, 1);
    assert!(engine.active_buffs("7", t0()).unwrap().is_empty());
}

#[test]
fn unknown_item_is_rejected() {
    let (_dir, engine) = engine();
    let err = engine.buy("7", None, "jetpack", None, t0()).unwrap_err();
    assert!(matches!(err, GameError::UnknownItem(ref name) if name == "jetpack"));
}

#[test]
fn lucky_charge_spent_only_on_squirrels() {
    let (_dir, engine) = engine();
    fund(&engine, "7", CurrencyTier::Silver, 2);
    engine.buy("7", None, "lucky_acorn", None, t0()).unwrap();

    let mut rng = StdRng::seed_from_u64(21);
    let mut squirrels = 0u32;
    for i in 0..6 {
        let now = t0() + Duration::seconds(30 * i);
        let report = engine.catch_with_rng(&mut rng, "7", None, now).unwrap();
        match report.outcome {
            RollOutcome::Species { .. } => {
                squirrels += 1;
                assert_eq!(report.charges_used, vec![BuffKind::LuckyAcorn]);
            }
            RollOutcome::Junk(_) => assert!(report.charges_used.is_empty()),
        }
    }

    let later = t0() + Duration::minutes(10);
    let lucky = engine
        .active_buffs("7", later)
        .unwrap()
        .into_iter()
        .find(|b| b.kind == BuffKind::LuckyAcorn)
        .unwrap();
    assert_eq!(lucky.charges_left, Some(10 - squirrels));
}

#[test]
fn doubler_pays_double_for_five_squirrels() {
    let (_dir, engine) = engine();
    fund(&engine, "7", CurrencyTier::Silver, 3);
    engine.buy("7", None, "acorn_doubler", None, t0()).unwrap();
    let doubled = Modifiers {
        acorn_multiplier: 2.0,
        ..Modifiers::default()
    };

    let mut rng = StdRng::seed_from_u64(33);
    let mut squirrels = 0u32;
    for i in 0..80 {
        let now = t0() + Duration::seconds(30 * i);
        let ctx = RollContext::for_player(&engine.player("7", None).unwrap());
        let report = engine.catch_with_rng(&mut rng, "7", None, now).unwrap();
        let doubler = engine
            .active_buffs("7", now)
            .unwrap()
            .into_iter()
            .find(|b| b.kind == BuffKind::AcornDoubler);

        match report.outcome {
            RollOutcome::Species { species, acorns } if squirrels < 5 => {
                squirrels += 1;
                assert_eq!(report.charges_used, vec![BuffKind::AcornDoubler]);
                assert!(acorns >= scale_reward(species.min_acorns, &ctx, &doubled));
                assert!(acorns <= scale_reward(species.max_acorns, &ctx, &doubled));
                match squirrels {
                    5 => assert!(doubler.is_none()),
                    n => assert_eq!(doubler.unwrap().charges_left, Some(5 - n)),
                }
            }
            RollOutcome::Species { .. } => {
                squirrels += 1;
                assert!(report.charges_used.is_empty());
                assert!(doubler.is_none());
            }
            RollOutcome::Junk(_) => {
                assert!(report.charges_used.is_empty());
                if squirrels < 5 {
                    assert_eq!(doubler.unwrap().charges_left, Some(5 - squirrels));
                }
            }
        }
    }
    assert!(squirrels > 5, "only {} squirrels in 80 catches", squirrels);
}

#[test]
fn plain_trap_enforces_full_cooldown() {
    let (_dir, engine) = engine();
    engine.catch("7", None, t0()).unwrap();
    let err = engine.catch("7", None, t0() + Duration::seconds(5)).unwrap_err();
    assert!(matches!(err, GameError::Cooldown { remaining_secs: 5 }));
}

#[test]
fn quick_trap_catch_ready_after_half_cooldown() {
    let (_dir, engine) = engine();
    fund(&engine, "8", CurrencyTier::Silver, 1);
    engine.buy("8", None, "quick trap", None, t0()).unwrap();
    engine.catch("8", None, t0()).unwrap();
    assert!(engine.catch("8", None, t0() + Duration::seconds(5)).is_ok());
}

#[test]
fn upgrades_walk_the_ladder_until_max() {
    let (_dir, engine) = engine();
    fund(&engine, "7", CurrencyTier::Silver, 25);

    let first = engine.upgrade("7", None, UpgradeLadder::Trap).unwrap();
    assert_eq!(first.new_tier, 1);
    let second = engine.buy("7", None, "sturdy trap", None, t0()).unwrap();
    match second {
        PurchaseReport::Upgrade(receipt) => assert_eq!(receipt.new_tier, 2),
        other => panic!("unexpected report {:?}", other),
    }
    let player = engine.player("7", None).unwrap();
    assert_eq!(player.trap_tier, 2);
    assert_eq!(player.silver_acorns, 0);

    let mut maxed = player.clone();
    maxed.junk_resist_tier = 5;
    maxed.golden_acorns = 100;
    engine.store().put_player(&maxed).unwrap();
    let err = engine.upgrade("7", None, UpgradeLadder::JunkResist).unwrap_err();
    assert!(matches!(err, GameError::MaxTier(_)));
    assert_eq!(engine.player("7", None).unwrap().golden_acorns, 100);
}
