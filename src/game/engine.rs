//! Game engine: every player-facing operation, on top of [`Store`].
//!
//! Operations take `now` explicitly so tests can pin the clock. The only
//! in-memory state is the per-user catch cooldown, which resets on restart.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use rand::Rng;

use crate::config::GameConfig;
use crate::game::buffs::{self, BuffLifetime, Modifiers};
use crate::game::catalog::find_species;
use crate::game::currency::{self, ExchangeReceipt, ExchangeStep};
use crate::game::errors::GameError;
use crate::game::leveling::grant_xp;
use crate::game::roll::{junk_chance, roll_catch, RollContext, RollOutcome};
use crate::game::shop::{self, Price, ShopEntry, UpgradeReceipt};
use crate::game::types::{BuffKind, BuffRecord, PlayerRecord, UpgradeLadder};
use crate::storage::{NewBuff, Store};

/// Daily bonus: flat part plus a per-level part.
pub const DAILY_BASE: u64 = 50;
pub const DAILY_PER_LEVEL: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct CatchReport {
    pub outcome: RollOutcome,
    pub xp_gained: u64,
    pub levels_gained: u32,
    pub level: u32,
    pub junk_chance: u32,
    /// Charge buffs that spent a charge on this catch.
    pub charges_used: Vec<BuffKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyReport {
    pub reward: u64,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellReceipt {
    pub species: &'static str,
    pub value: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseReport {
    /// A new charge buff instance.
    Charges { kind: BuffKind, price: Price, charges: u32 },
    /// A timed buff, new or extended.
    Timed {
        kind: BuffKind,
        price: Price,
        expires_at: DateTime<Utc>,
        extended: bool,
    },
    Upgrade(UpgradeReceipt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub label: String,
    pub total_value: u64,
    pub total_catches: u64,
    pub level: u32,
}

/// A buff row written by a purchase, kept so the write can be undone.
#[derive(Debug, Clone, Copy)]
enum BuffWrite {
    Added(u64),
    Extended {
        id: u64,
        previous: Option<DateTime<Utc>>,
    },
}

pub struct GameEngine {
    store: Store,
    config: GameConfig,
    /// user id -> earliest time the next manual catch is allowed
    cooldowns: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl GameEngine {
    pub fn new(store: Store, config: GameConfig) -> Self {
        Self {
            store,
            config,
            cooldowns: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    fn load_player(&self, user_id: &str, name: Option<&str>) -> Result<PlayerRecord, GameError> {
        let mut player = self.store.get_player(user_id)?;
        if let Some(name) = name {
            if player.display_name.as_deref() != Some(name) {
                player.display_name = Some(name.to_string());
                self.store.put_player(&player)?;
            }
        }
        Ok(player)
    }

    /// Apply a roll to the player record. Returns (xp gained, levels gained).
    pub(crate) fn apply_outcome(player: &mut PlayerRecord, outcome: &RollOutcome) -> (u64, u32) {
        let xp = match outcome {
            RollOutcome::Junk(junk) => {
                player.junk_catches += 1;
                player.acorns = player.acorns.saturating_add(junk.acorns);
                1
            }
            RollOutcome::Species { species, acorns } => {
                player.acorns = player.acorns.saturating_add(*acorns);
                player.total_catches += 1;
                *player.catches.entry(species.name.to_string()).or_insert(0) += 1;
                species.rarity.xp()
            }
        };
        let levels = grant_xp(player, xp);
        (xp, levels)
    }

    /// Set a trap. Fails with [`GameError::Cooldown`] while the trap recharges.
    pub fn catch(
        &self,
        user_id: &str,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CatchReport, GameError> {
        self.catch_with_rng(&mut rand::thread_rng(), user_id, name, now)
    }

    pub fn catch_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        user_id: &str,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CatchReport, GameError> {
        let active = self.store.get_active_buffs(user_id, now)?;
        let mods = Modifiers::from_buffs(&active, now);
        {
            let mut cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(ready_at) = cooldowns.get(user_id) {
                if *ready_at > now {
                    let ms = ready_at.signed_duration_since(now).num_milliseconds();
                    return Err(GameError::Cooldown {
                        remaining_secs: ((ms + 999) / 1000) as u64,
                    });
                }
            }
            let base = Duration::seconds(self.config.catch_cooldown_secs as i64);
            cooldowns.insert(user_id.to_string(), now + mods.effective_cooldown(base));
        }

        // Any earlier entry had already elapsed, so dropping ours is a full rollback.
        self.settle_catch(rng, user_id, name, now, &active, &mods)
            .map_err(|err| {
                self.cooldowns
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(user_id);
                err
            })
    }

    fn settle_catch<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        user_id: &str,
        name: Option<&str>,
        now: DateTime<Utc>,
        active: &[BuffRecord],
        mods: &Modifiers,
    ) -> Result<CatchReport, GameError> {
        let mut player = self.load_player(user_id, name)?;
        let ctx = RollContext::for_player(&player);
        let outcome = roll_catch(rng, &ctx, mods);
        let (xp_gained, levels_gained) = Self::apply_outcome(&mut player, &outcome);

        let mut charges_used = Vec::new();
        if matches!(outcome, RollOutcome::Species { .. }) {
            for id in mods.rare_charge_ids.iter().chain(&mods.acorn_charge_ids) {
                if let Some(buff) = active.iter().find(|b| b.id == *id) {
                    self.store.consume_buff_charge(*id)?;
                    charges_used.push(buff.kind);
                }
            }
        }

        self.store.put_player(&player)?;
        if levels_gained > 0 {
            info!("Player {} reached level {}", user_id, player.level);
        }
        debug!("Catch for {}: {:?}", user_id, outcome);
        Ok(CatchReport {
            outcome,
            xp_gained,
            levels_gained,
            level: player.level,
            junk_chance: junk_chance(&ctx, mods),
            charges_used,
        })
    }

    /// Claim the daily bonus.
    pub fn daily(
        &self,
        user_id: &str,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DailyReport, GameError> {
        let mut player = self.load_player(user_id, name)?;
        let window = Duration::hours(self.config.daily_cooldown_hours as i64);
        if let Some(last) = player.last_daily {
            let elapsed = now.signed_duration_since(last);
            if elapsed < window {
                let remaining = window - elapsed;
                return Err(GameError::DailyClaimed {
                    hours: remaining.num_hours(),
                    minutes: remaining.num_minutes() % 60,
                });
            }
        }
        let reward = DAILY_BASE + player.level as u64 * DAILY_PER_LEVEL;
        player.acorns = player.acorns.saturating_add(reward);
        player.last_daily = Some(now);
        self.store.put_player(&player)?;
        Ok(DailyReport {
            reward,
            level: player.level,
        })
    }

    pub fn exchange(
        &self,
        user_id: &str,
        name: Option<&str>,
        step: ExchangeStep,
        amount: u64,
    ) -> Result<ExchangeReceipt, GameError> {
        let mut player = self.load_player(user_id, name)?;
        let receipt = currency::exchange(&mut player, step, amount)?;
        self.store.put_player(&player)?;
        Ok(receipt)
    }

    /// Sell one squirrel of the named species for the midpoint of its acorn range.
    pub fn sell(
        &self,
        user_id: &str,
        name: Option<&str>,
        species_name: &str,
    ) -> Result<SellReceipt, GameError> {
        let species = find_species(species_name)
            .ok_or_else(|| GameError::UnknownSpecies(species_name.trim().to_string()))?;
        let mut player = self.load_player(user_id, name)?;
        let owned = player.catches.get(species.name).copied().unwrap_or(0);
        if owned < 1 {
            return Err(GameError::NothingToSell(species.name.to_string()));
        }
        let remaining = owned - 1;
        if remaining == 0 {
            player.catches.remove(species.name);
        } else {
            player.catches.insert(species.name.to_string(), remaining);
        }
        let value = species.sell_value();
        player.acorns = player.acorns.saturating_add(value);
        self.store.put_player(&player)?;
        Ok(SellReceipt {
            species: species.name,
            value,
            remaining,
        })
    }

    /// Buy a shop item or upgrade by name. `channel_id` becomes the
    /// notification channel of hunter buffs.
    pub fn buy(
        &self,
        user_id: &str,
        name: Option<&str>,
        item: &str,
        channel_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PurchaseReport, GameError> {
        match shop::resolve_item(item) {
            Some(ShopEntry::Buff(kind)) => self.buy_buff(user_id, name, kind, channel_id, now),
            Some(ShopEntry::Upgrade(ladder)) => self
                .upgrade(user_id, name, ladder)
                .map(PurchaseReport::Upgrade),
            None => Err(GameError::UnknownItem(item.trim().to_string())),
        }
    }

    fn buy_buff(
        &self,
        user_id: &str,
        name: Option<&str>,
        kind: BuffKind,
        channel_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PurchaseReport, GameError> {
        let mut player = self.load_player(user_id, name)?;
        let price = shop::charge_for_buff(&mut player, kind)?;

        let (report, write) = match buffs::lifetime(kind) {
            BuffLifetime::Charges(charges) => {
                let id = self.store.add_buff(
                    NewBuff {
                        user_id: user_id.to_string(),
                        kind,
                        charges: Some(charges),
                        expires_at: None,
                        channel_id: None,
                    },
                    now,
                )?;
                let report = PurchaseReport::Charges {
                    kind,
                    price,
                    charges,
                };
                (report, BuffWrite::Added(id))
            }
            BuffLifetime::Timed(duration) => {
                let existing = self
                    .store
                    .get_active_buffs(user_id, now)?
                    .into_iter()
                    .find(|b| b.kind == kind);
                match existing {
                    Some(buff) => {
                        let expires_at = self
                            .store
                            .extend_buff(buff.id, duration, now)?
                            .unwrap_or(now + duration);
                        let report = PurchaseReport::Timed {
                            kind,
                            price,
                            expires_at,
                            extended: true,
                        };
                        let write = BuffWrite::Extended {
                            id: buff.id,
                            previous: buff.expires_at,
                        };
                        (report, write)
                    }
                    None => {
                        let expires_at = now + duration;
                        let id = self.store.add_buff(
                            NewBuff {
                                user_id: user_id.to_string(),
                                kind,
                                charges: None,
                                expires_at: Some(expires_at),
                                channel_id: channel_id.map(str::to_string),
                            },
                            now,
                        )?;
                        let report = PurchaseReport::Timed {
                            kind,
                            price,
                            expires_at,
                            extended: false,
                        };
                        (report, BuffWrite::Added(id))
                    }
                }
            }
        };
        if let Err(err) = self.store.put_player(&player) {
            // Stored balance is unchanged, so drop the buff too.
            if let Err(revert_err) = self.revert_buff_write(write) {
                warn!(
                    "Could not undo {} purchase for {}: {}",
                    kind.key(),
                    user_id,
                    revert_err
                );
            }
            return Err(err);
        }
        info!("Player {} bought {} for {}", user_id, kind.key(), price);
        Ok(report)
    }

    fn revert_buff_write(&self, write: BuffWrite) -> Result<(), GameError> {
        match write {
            BuffWrite::Added(id) => self.store.delete_buff(id),
            BuffWrite::Extended { id, previous } => {
                self.store.set_buff_expiry(id, previous).map(|_| ())
            }
        }
    }

    pub fn upgrade(
        &self,
        user_id: &str,
        name: Option<&str>,
        ladder: UpgradeLadder,
    ) -> Result<UpgradeReceipt, GameError> {
        let mut player = self.load_player(user_id, name)?;
        let receipt = shop::apply_upgrade(&mut player, ladder)?;
        self.store.put_player(&player)?;
        info!(
            "Player {} upgraded {} to tier {}",
            user_id,
            ladder.key(),
            receipt.new_tier
        );
        Ok(receipt)
    }

    /// Player record for the bag, balance, profile and bestiary views.
    pub fn player(&self, user_id: &str, name: Option<&str>) -> Result<PlayerRecord, GameError> {
        self.load_player(user_id, name)
    }

    pub fn active_buffs(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<BuffRecord>, GameError> {
        self.store.get_active_buffs(user_id, now)
    }

    /// Top `limit` players by net worth, ties broken by catches then user id.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GameError> {
        let mut rows: Vec<(u64, PlayerRecord)> = self
            .store
            .load_all_players()?
            .into_iter()
            .map(|p| (currency::total_value(&p), p))
            .collect();
        rows.sort_by(|(va, a), (vb, b)| {
            vb.cmp(va)
                .then(b.total_catches.cmp(&a.total_catches))
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(rows
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (total_value, p))| LeaderboardEntry {
                rank: i + 1,
                label: p.label(),
                user_id: p.user_id,
                total_value,
                total_catches: p.total_catches,
                level: p.level,
            })
            .collect())
    }

    /// Drop cooldown entries that have already elapsed to bound memory.
    pub fn prune_cooldowns(&self, now: DateTime<Utc>) -> usize {
        let mut cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        let before = cooldowns.len();
        cooldowns.retain(|_, ready_at| *ready_at > now);
        before - cooldowns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn engine() -> (TempDir, GameEngine) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, GameEngine::new(store, GameConfig::default()))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 12, 18, 0, 0).unwrap()
    }

    #[test]
    fn failed_catch_leaves_trap_ready() {
        let (_dir, engine) = engine();
        let mut rng = StdRng::seed_from_u64(5);
        engine.store().put_raw_player("44", &[0x01]).unwrap();

        let err = engine.catch_with_rng(&mut rng, "44", None, t0()).unwrap_err();
        assert!(!matches!(err, GameError::Cooldown { .. }), "{:?}", err);

        engine.store().put_player(&PlayerRecord::new("44")).unwrap();
        assert!(engine.catch_with_rng(&mut rng, "44", None, t0()).is_ok());
        assert!(matches!(
            engine.catch_with_rng(&mut rng, "44", None, t0()),
            Err(GameError::Cooldown { remaining_secs: 10 })
        ));
    }

    #[test]
    fn undoing_a_new_buff_deletes_it() {
        let (_dir, engine) = engine();
        let mut player = engine.player("44", None).unwrap();
        player.silver_acorns = 3;
        engine.store().put_player(&player).unwrap();

        engine.buy("44", None, "acorn_doubler", None, t0()).unwrap();
        let buff = engine.active_buffs("44", t0()).unwrap().remove(0);

        engine.revert_buff_write(BuffWrite::Added(buff.id)).unwrap();
        assert!(engine.store().get_buff(buff.id).unwrap().is_none());
    }

    #[test]
    fn undoing_an_extension_restores_the_old_expiry() {
        let (_dir, engine) = engine();
        let mut player = engine.player("44", None).unwrap();
        player.silver_acorns = 2;
        engine.store().put_player(&player).unwrap();

        engine.buy("44", None, "quick_trap", None, t0()).unwrap();
        let first = engine.active_buffs("44", t0()).unwrap().remove(0);
        assert_eq!(first.expires_at, Some(t0() + Duration::minutes(30)));

        let later = t0() + Duration::minutes(10);
        engine.buy("44", None, "quick_trap", None, later).unwrap();
        let extended = engine.store().get_buff(first.id).unwrap().unwrap();
        assert_eq!(extended.expires_at, Some(t0() + Duration::minutes(60)));

        engine
            .revert_buff_write(BuffWrite::Extended {
                id: first.id,
                previous: first.expires_at,
            })
            .unwrap();
        let restored = engine.store().get_buff(first.id).unwrap().unwrap();
        assert_eq!(restored.expires_at, first.expires_at);
    }
}
