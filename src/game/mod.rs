//! Squirrel Catcher game rules.
//! Pure rule modules (roll, leveling, buffs, currency, shop) operate on plain
//! records; [`engine::GameEngine`] wires them to the sled store.

pub mod auto_catch;
pub mod buffs;
pub mod catalog;
pub mod currency;
pub mod engine;
pub mod errors;
pub mod leveling;
pub mod roll;
pub mod shop;
pub mod types;

pub use auto_catch::{AutoCatchNotice, TickSummary};
pub use buffs::{BuffLifetime, Modifiers};
pub use catalog::{find_species, species_by_name, Junk, Species, JUNK, SPECIES};
pub use currency::{exchange, total_value, ExchangeReceipt, ExchangeStep};
pub use engine::{CatchReport, DailyReport, GameEngine, LeaderboardEntry, PurchaseReport, SellReceipt};
pub use errors::GameError;
pub use leveling::{grant_xp, xp_for_level};
pub use roll::{roll_catch, RollContext, RollOutcome};
pub use shop::{Price, ShopEntry, UpgradeReceipt, MAX_UPGRADE_TIER};
pub use types::*;
