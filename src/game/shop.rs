//! Shop catalog for the acorn economy.
//!
//! This module provides:
//! - Prices for temporary buffs (paid from a single currency tier)
//! - The three permanent upgrade ladders and their tier costs
//! - Item name resolution for `buy` / `upgrade`
//! - Listing text for the `shop` command

use crate::game::buffs;
use crate::game::currency::{format_price, spend};
use crate::game::errors::GameError;
use crate::game::roll::{JUNK_RESIST_PER_TIER, MAGNET_BONUS_PER_TIER, TRAP_BONUS_PER_TIER};
use crate::game::types::{BuffKind, CurrencyTier, PlayerRecord, UpgradeLadder};

/// Highest reachable tier on every upgrade ladder.
pub const MAX_UPGRADE_TIER: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price {
    pub tier: CurrencyTier,
    pub amount: u64,
}

impl Price {
    const fn new(tier: CurrencyTier, amount: u64) -> Self {
        Self { tier, amount }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_price(self.tier, self.amount))
    }
}

pub fn buff_price(kind: BuffKind) -> Price {
    match kind {
        BuffKind::LuckyAcorn => Price::new(CurrencyTier::Silver, 2),
        BuffKind::AcornDoubler => Price::new(CurrencyTier::Silver, 3),
        BuffKind::JunkRepellent => Price::new(CurrencyTier::Silver, 1),
        BuffKind::QuickTrap => Price::new(CurrencyTier::Silver, 1),
        BuffKind::SquirrelHunter => Price::new(CurrencyTier::Emerald, 1),
        BuffKind::EliteHunter => Price::new(CurrencyTier::Emerald, 5),
    }
}

/// Cost of reaching `tier` (1-based) on any ladder. `None` past the top.
pub fn upgrade_cost(tier: u8) -> Option<Price> {
    match tier {
        1 => Some(Price::new(CurrencyTier::Silver, 5)),
        2 => Some(Price::new(CurrencyTier::Silver, 20)),
        3 => Some(Price::new(CurrencyTier::Emerald, 5)),
        4 => Some(Price::new(CurrencyTier::Emerald, 20)),
        5 => Some(Price::new(CurrencyTier::Golden, 5)),
        _ => None,
    }
}

/// Human readable effect of holding `tier` on `ladder`.
pub fn upgrade_effect(ladder: UpgradeLadder, tier: u8) -> String {
    let tier = tier as f64;
    match ladder {
        UpgradeLadder::Trap => format!("+{:.0}% rare weight", TRAP_BONUS_PER_TIER * tier * 100.0),
        UpgradeLadder::JunkResist => format!("-{:.0}% junk chance", JUNK_RESIST_PER_TIER as f64 * tier),
        UpgradeLadder::AcornMagnet => format!("+{:.0}% acorns", MAGNET_BONUS_PER_TIER * tier * 100.0),
    }
}

/// Anything a player can name after `buy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopEntry {
    Buff(BuffKind),
    Upgrade(UpgradeLadder),
}

pub fn resolve_item(raw: &str) -> Option<ShopEntry> {
    if let Some(kind) = BuffKind::from_key(raw) {
        return Some(ShopEntry::Buff(kind));
    }
    UpgradeLadder::from_key(raw).map(ShopEntry::Upgrade)
}

/// Deduct the price of a buff from the player. Caller persists the player and the buff.
pub fn charge_for_buff(player: &mut PlayerRecord, kind: BuffKind) -> Result<Price, GameError> {
    let price = buff_price(kind);
    spend(player, price.tier, price.amount)?;
    Ok(price)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeReceipt {
    pub ladder: UpgradeLadder,
    pub new_tier: u8,
    pub price: Price,
}

/// Raise `ladder` by one tier, paying its cost.
pub fn apply_upgrade(
    player: &mut PlayerRecord,
    ladder: UpgradeLadder,
) -> Result<UpgradeReceipt, GameError> {
    let current = player.tier(ladder);
    if current >= MAX_UPGRADE_TIER {
        return Err(GameError::MaxTier(ladder.name()));
    }
    let new_tier = current + 1;
    let price = upgrade_cost(new_tier).ok_or(GameError::MaxTier(ladder.name()))?;
    spend(player, price.tier, price.amount)?;
    *player.tier_mut(ladder) = new_tier;
    Ok(UpgradeReceipt {
        ladder,
        new_tier,
        price,
    })
}

/// Listing for the `shop` command.
pub fn shop_listing(prefix: &str) -> String {
    let mut out = String::from("**Boosts**\n");
    for kind in BuffKind::ALL {
        out.push_str(&format!(
            "{} **{}** `{}` — {} — {}\n",
            kind.emoji(),
            kind.name(),
            kind.key(),
            buffs::describe(kind),
            buff_price(kind)
        ));
    }
    out.push_str("\n**Permanent upgrades** (max tier ");
    out.push_str(&MAX_UPGRADE_TIER.to_string());
    out.push_str(")\n");
    for ladder in UpgradeLadder::ALL {
        out.push_str(&format!(
            "{} **{}** `{}` — {} per tier\n",
            ladder.emoji(),
            ladder.name(),
            ladder.key(),
            upgrade_effect(ladder, 1)
        ));
    }
    let costs: Vec<String> = (1..=MAX_UPGRADE_TIER)
        .filter_map(|t| upgrade_cost(t).map(|p| format!("T{} {}", t, p)))
        .collect();
    out.push_str(&format!("Tier costs: {}\n", costs.join(" · ")));
    out.push_str(&format!(
        "\nBuy with `{p}buy <item>` or `{p}upgrade <trap|junk|magnet>`.",
        p = prefix
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_buffs_and_upgrades() {
        assert_eq!(resolve_item("lucky acorn"), Some(ShopEntry::Buff(BuffKind::LuckyAcorn)));
        assert_eq!(resolve_item("Magnet"), Some(ShopEntry::Upgrade(UpgradeLadder::AcornMagnet)));
        assert_eq!(resolve_item("rocket"), None);
    }

    #[test]
    fn upgrade_walks_the_ladder() {
        let mut p = PlayerRecord::new("u");
        p.silver_acorns = 25;
        let r = apply_upgrade(&mut p, UpgradeLadder::Trap).unwrap();
        assert_eq!(r.new_tier, 1);
        assert_eq!(p.silver_acorns, 20);
        let r = apply_upgrade(&mut p, UpgradeLadder::Trap).unwrap();
        assert_eq!(r.new_tier, 2);
        assert_eq!(p.silver_acorns, 0);
        let err = apply_upgrade(&mut p, UpgradeLadder::Trap).unwrap_err();
        assert!(matches!(
            err,
            GameError::InsufficientFunds { tier: CurrencyTier::Emerald, have: 0, need: 5 }
        ));
        assert_eq!(p.trap_tier, 2);
    }

    #[test]
    fn max_tier_is_final() {
        let mut p = PlayerRecord::new("u");
        p.golden_acorns = 100;
        p.junk_resist_tier = MAX_UPGRADE_TIER;
        assert!(matches!(
            apply_upgrade(&mut p, UpgradeLadder::JunkResist),
            Err(GameError::MaxTier(_))
        ));
        assert_eq!(p.golden_acorns, 100);
    }

    #[test]
    fn effects_read_naturally() {
        assert_eq!(upgrade_effect(UpgradeLadder::Trap, 2), "+10% rare weight");
        assert_eq!(upgrade_effect(UpgradeLadder::JunkResist, 3), "-6% junk chance");
        assert_eq!(upgrade_effect(UpgradeLadder::AcornMagnet, 5), "+50% acorns");
    }
}
