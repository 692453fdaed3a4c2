//! Views: turn engine results into [`Reply`] values.

use chrono::{DateTime, Utc};

use crate::bot::reply::{Embed, Reply};
use crate::game::auto_catch::AutoCatchNotice;
use crate::game::buffs::{self, BuffLifetime};
use crate::game::catalog::{species_by_name, SPECIES};
use crate::game::currency::{exchange_rates_text, group_digits, total_value, ExchangeReceipt, ExchangeStep};
use crate::game::engine::{CatchReport, DailyReport, LeaderboardEntry, PurchaseReport, SellReceipt};
use crate::game::errors::GameError;
use crate::game::leveling::xp_for_level;
use crate::game::roll::RollOutcome;
use crate::game::shop::{self, UpgradeReceipt, MAX_UPGRADE_TIER};
use crate::game::types::{BuffRecord, CurrencyTier, PlayerRecord, UpgradeLadder};

const BROWN: u32 = 0x8B4513;
const GREY: u32 = 0x95A5A6;
const GREEN: u32 = 0x2ECC71;
const ORANGE: u32 = 0xF39C12;
const GOLD: u32 = 0xF1C40F;
const BLUE: u32 = 0x3498DB;
const PURPLE: u32 = 0x9B59B6;

pub const SUSPENSE_LINE: &str = "🪤 Setting your trap in the forest...";
pub const GENERIC_FAILURE: &str = "❌ Something went wrong! Try again.";

pub fn help(prefix: &str) -> Reply {
    let commands = [
        ("catch", "Set a trap and try to catch a squirrel!"),
        ("bag", "View your caught squirrels"),
        ("balance", "Check your acorn stash"),
        ("profile", "View your full profile"),
        ("exchange <amount>", "Convert 100 acorns → 1 silver acorn, etc."),
        ("leaderboard", "See the top squirrel catchers"),
        ("bestiary", "View all discoverable squirrels"),
        ("sell <squirrel name>", "Sell a squirrel from your bag"),
        ("daily", "Claim your daily acorn bonus"),
        ("shop", "Browse boosts and upgrades"),
        ("buy <item>", "Buy a boost or upgrade"),
        ("upgrade [trap|junk|magnet]", "View or raise your permanent upgrades"),
        ("buffs", "See your active boosts"),
    ];
    let mut embed = Embed::new("🐿️ Squirrel Catcher - Commands", BROWN)
        .description("Catch squirrels, earn acorns, become the ultimate wrangler!");
    for (usage, what) in commands {
        embed = embed.field(format!("`{}{}`", prefix, usage), what, false);
    }
    Reply::embed(embed.footer("Or just use the buttons and menu below! 🌰"))
}

pub fn welcome(prefix: &str) -> Reply {
    let embed = Embed::new("🐿️ Squirrel Catcher has arrived!", BROWN)
        .description(format!(
            "Catch squirrels, earn acorns, and compete with your friends!\n\n\
             Use the **buttons** below or type commands with `{}`.\n\
             Hit **Catch** to set your first trap!",
            prefix.trim_end()
        ))
        .field(
            "Quick Start",
            "🪤 **Catch**: Set a trap\n🎒 **Bag**: View your squirrels\n\
             💰 **Balance**: Check your acorns\n🐿️ **Profile**: See your stats",
            false,
        )
        .footer(format!("Type {}help for all commands", prefix));
    Reply::embed(embed)
}

fn outcome_embed(outcome: &RollOutcome) -> Embed {
    match outcome {
        RollOutcome::Junk(junk) => {
            let mut text = "Better luck next time!".to_string();
            if junk.acorns > 0 {
                text.push_str(&format!("\nBut you found **{}** 🌰!", junk.acorns));
            }
            Embed::new(format!("{} You caught... {}!", junk.emoji, junk.name), GREY).description(text)
        }
        RollOutcome::Species { species, acorns } => {
            let embed = Embed::new(
                format!("{} You caught a {}!", species.emoji, species.name),
                species.rarity.color(),
            )
            .description(format!(
                "**Rarity:** {}\n**Reward:** {} 🌰",
                species.rarity.name(),
                group_digits(*acorns)
            ));
            if species.rarity.is_showcase() {
                embed.footer(format!("🎉 Wow! A {} catch!", species.rarity.name()))
            } else {
                embed
            }
        }
    }
}

pub fn catch_result(report: &CatchReport) -> Reply {
    let mut embed = outcome_embed(&report.outcome);
    if report.levels_gained > 0 {
        embed = embed.field(
            "🎉 LEVEL UP!",
            format!("You are now **Level {}**!", report.level),
            false,
        );
    }
    if !report.charges_used.is_empty() {
        let used: Vec<String> = report
            .charges_used
            .iter()
            .map(|kind| format!("{} {}", kind.emoji(), kind.name()))
            .collect();
        embed = embed.field("Boosts used", used.join(", "), false);
    }
    Reply::embed(embed).with_suspense(SUSPENSE_LINE)
}

pub fn auto_catch(notice: &AutoCatchNotice) -> Reply {
    let mut embed = outcome_embed(&notice.outcome);
    embed.title = format!(
        "{} {}'s hunter: {}",
        notice.hunter.emoji(),
        notice.label,
        embed.title.replacen("You caught", "caught", 1)
    );
    if notice.levels_gained > 0 {
        embed = embed.field(
            "🎉 LEVEL UP!",
            format!("{} is now **Level {}**!", notice.label, notice.level),
            false,
        );
    }
    Reply::embed(embed)
}

pub fn bag(player: &PlayerRecord, label: &str) -> Reply {
    let title = format!("🎒 {}'s Squirrel Bag", label);
    if player.catches.is_empty() {
        return Reply::embed(
            Embed::new(title, BROWN).description("Your bag is empty! Hit **Catch** to start!"),
        );
    }
    let mut owned: Vec<(&String, &u64)> = player.catches.iter().collect();
    owned.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    let lines: Vec<String> = owned
        .into_iter()
        .filter_map(|(name, count)| {
            species_by_name(name).map(|s| {
                format!("{} **{}** ({}) x{}", s.emoji, s.name, s.rarity.name(), count)
            })
        })
        .collect();
    Reply::embed(
        Embed::new(title, BROWN)
            .description(lines.join("\n"))
            .footer(format!(
                "Total unique species: {} / {}",
                player.unique_species(),
                SPECIES.len()
            )),
    )
}

pub fn balance(player: &PlayerRecord, label: &str) -> Reply {
    let lines: Vec<String> = CurrencyTier::ALL
        .iter()
        .map(|&tier| {
            format!(
                "{} **{}:** {}",
                tier.emoji(),
                tier.name(),
                group_digits(player.balance(tier))
            )
        })
        .collect();
    Reply::embed(
        Embed::new(format!("💰 {}'s Acorn Stash", label), ORANGE)
            .description(lines.join("\n"))
            .footer(format!(
                "Total value: {} acorns",
                group_digits(total_value(player))
            )),
    )
}

pub fn profile(player: &PlayerRecord, label: &str) -> Reply {
    let stash: Vec<String> = CurrencyTier::ALL
        .iter()
        .map(|&tier| format!("{} {}", tier.emoji(), group_digits(player.balance(tier))))
        .collect();
    let upgrades: Vec<String> = UpgradeLadder::ALL
        .iter()
        .map(|&ladder| format!("{} T{}", ladder.emoji(), player.tier(ladder)))
        .collect();
    let embed = Embed::new(format!("🐿️ {}'s Profile", label), BROWN)
        .field(
            "Level",
            format!(
                "**{}** ({}/{} XP)",
                player.level,
                player.xp,
                xp_for_level(player.level)
            ),
            true,
        )
        .field("Total Catches", format!("🐿️ {}", player.total_catches), true)
        .field("Junk Catches", format!("🗑️ {}", player.junk_catches), true)
        .field("Acorn Stash", stash.join(" | "), false)
        .field("Upgrades", upgrades.join(" | "), false)
        .field(
            "Bestiary",
            format!(
                "📖 {}/{} species discovered",
                player.unique_species(),
                SPECIES.len()
            ),
            false,
        );
    Reply::embed(embed)
}

pub fn daily(report: &DailyReport) -> Reply {
    Reply::embed(
        Embed::new("🎁 Daily Bonus Claimed!", GREEN).description(format!(
            "You received **{}** 🌰 acorns!\n(Level {} bonus)",
            group_digits(report.reward),
            report.level
        )),
    )
}

pub fn bestiary(player: &PlayerRecord) -> Reply {
    let lines: Vec<String> = SPECIES
        .iter()
        .map(|s| match player.catches.get(s.name) {
            Some(count) => format!(
                "{} **{}**: {} ✅ (x{})",
                s.emoji,
                s.name,
                s.rarity.name(),
                count
            ),
            None => format!("❓ **???**: {}", s.rarity.name()),
        })
        .collect();
    Reply::embed(
        Embed::new("📖 Squirrel Bestiary", BROWN)
            .description(lines.join("\n"))
            .footer(format!(
                "Discovered: {}/{}",
                player.unique_species(),
                SPECIES.len()
            )),
    )
}

pub fn leaderboard(entries: &[LeaderboardEntry]) -> Reply {
    if entries.is_empty() {
        return Reply::embed(
            Embed::new("🏆 Leaderboard", GOLD).description("No squirrel catchers yet!"),
        );
    }
    const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];
    let lines: Vec<String> = entries
        .iter()
        .map(|e| {
            let place = MEDALS
                .get(e.rank - 1)
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("**{}.**", e.rank));
            format!(
                "{} **{}**: Lvl {} | {} 🌰 | {} catches",
                place,
                e.label,
                e.level,
                group_digits(e.total_value),
                e.total_catches
            )
        })
        .collect();
    Reply::embed(
        Embed::new("🏆 Squirrel Catcher Leaderboard", GOLD).description(lines.join("\n")),
    )
}

pub fn exchange_rates(prefix: &str) -> Reply {
    Reply::embed(Embed::new("🔄 Exchange Rates", BLUE).description(exchange_rates_text(prefix)))
}

/// Reply for an exchange command without a usable amount.
pub fn exchange_usage(step: ExchangeStep, prefix: &str) -> Reply {
    match step {
        ExchangeStep::AcornsToSilver => exchange_rates(prefix),
        ExchangeStep::SilverToEmerald => Reply::text(format!(
            "Usage: `{}exchange_silver <amount>` (10 {} = 1 {})",
            prefix,
            step.from_tier().emoji(),
            step.to_tier().emoji()
        )),
        ExchangeStep::EmeraldToGolden => Reply::text(format!(
            "Usage: `{}exchange_emerald <amount>` (10 {} = 1 {})",
            prefix,
            step.from_tier().emoji(),
            step.to_tier().emoji()
        )),
    }
}

pub fn exchange_done(receipt: &ExchangeReceipt) -> Reply {
    let to = receipt.step.to_tier();
    Reply::text(format!(
        "🔄 Exchanged **{}** {} → **{}** {} {}!",
        group_digits(receipt.spent),
        receipt.step.from_tier().emoji(),
        group_digits(receipt.gained),
        to.emoji(),
        to.name()
    ))
}

pub fn sell_usage(prefix: &str) -> Reply {
    Reply::text(format!(
        "Usage: `{}sell <squirrel name>`: sell one squirrel for acorns.",
        prefix
    ))
}

pub fn sold(receipt: &SellReceipt) -> Reply {
    Reply::text(format!(
        "💰 Sold **{}** for **{}** 🌰 acorns!",
        receipt.species,
        group_digits(receipt.value)
    ))
}

pub fn shop(prefix: &str) -> Reply {
    Reply::embed(Embed::new("🛒 Acorn Shop", PURPLE).description(shop::shop_listing(prefix)))
}

pub fn buy_usage(prefix: &str) -> Reply {
    Reply::text(format!(
        "Usage: `{p}buy <item>`. See `{p}shop` for what's on sale.",
        p = prefix
    ))
}

pub fn purchased(report: &PurchaseReport, now: DateTime<Utc>) -> Reply {
    match report {
        PurchaseReport::Charges {
            kind,
            price,
            charges,
        } => Reply::text(format!(
            "🛒 Bought {} **{}** for {}! Good for your next **{}** catches.",
            kind.emoji(),
            kind.name(),
            price,
            charges
        )),
        PurchaseReport::Timed {
            kind,
            price,
            expires_at,
            extended,
        } => {
            let minutes = expires_at.signed_duration_since(now).num_minutes();
            let verb = if *extended { "Extended" } else { "Activated" };
            Reply::text(format!(
                "🛒 {} {} **{}** for {}! Active for **{}m**.",
                verb,
                kind.emoji(),
                kind.name(),
                price,
                minutes
            ))
        }
        PurchaseReport::Upgrade(receipt) => upgraded(receipt),
    }
}

pub fn upgraded(receipt: &UpgradeReceipt) -> Reply {
    Reply::text(format!(
        "⬆️ {} **{}** is now tier **{}** ({}) for {}!",
        receipt.ladder.emoji(),
        receipt.ladder.name(),
        receipt.new_tier,
        shop::upgrade_effect(receipt.ladder, receipt.new_tier),
        receipt.price
    ))
}

/// Current tier and next cost of every ladder.
pub fn upgrades(player: &PlayerRecord, prefix: &str) -> Reply {
    let lines: Vec<String> = UpgradeLadder::ALL
        .iter()
        .map(|&ladder| {
            let tier = player.tier(ladder);
            let next = match shop::upgrade_cost(tier + 1) {
                Some(price) if tier < MAX_UPGRADE_TIER => format!("next: {}", price),
                _ => "max tier".to_string(),
            };
            format!(
                "{} **{}** T{}/{} ({}), {}",
                ladder.emoji(),
                ladder.name(),
                tier,
                MAX_UPGRADE_TIER,
                shop::upgrade_effect(ladder, tier),
                next
            )
        })
        .collect();
    Reply::embed(
        Embed::new("⬆️ Permanent Upgrades", PURPLE)
            .description(lines.join("\n"))
            .footer(format!("Use {}upgrade <trap|junk|magnet>", prefix)),
    )
}

pub fn buff_list(active: &[BuffRecord], now: DateTime<Utc>) -> Reply {
    if active.is_empty() {
        return Reply::embed(
            Embed::new("✨ Active Boosts", PURPLE).description("No active boosts. Visit the shop!"),
        );
    }
    let lines: Vec<String> = active
        .iter()
        .map(|b| {
            let left = match (buffs::lifetime(b.kind), b.charges_left, b.expires_at) {
                (BuffLifetime::Charges(_), Some(n), _) => format!("{} catches left", n),
                (_, _, Some(at)) => {
                    let mins = at.signed_duration_since(now).num_minutes().max(0);
                    format!("{}m left", mins)
                }
                _ => "active".to_string(),
            };
            format!("{} **{}**: {}", b.kind.emoji(), b.kind.name(), left)
        })
        .collect();
    Reply::embed(Embed::new("✨ Active Boosts", PURPLE).description(lines.join("\n")))
}

/// User-facing rendering of an engine error. Internal errors collapse into
/// [`GENERIC_FAILURE`]; the caller logs them.
pub fn error(err: &GameError, prefix: &str) -> Reply {
    match err {
        GameError::Cooldown { remaining_secs } => Reply::text(format!(
            "⏳ Your trap is recharging! Try again in **{}s**.",
            remaining_secs
        ))
        .ephemeral(),
        GameError::DailyClaimed { hours, minutes } => Reply::embed(
            Embed::new("⏳ Daily Already Claimed", GREY)
                .description(format!("Come back in **{}h {}m**.", hours, minutes)),
        ),
        GameError::InsufficientFunds { tier, have, need } => Reply::text(format!(
            "❌ You only have **{}** {}, need **{}**!",
            group_digits(*have),
            tier.emoji(),
            group_digits(*need)
        )),
        GameError::BelowExchangeMinimum { tier, minimum } => Reply::text(format!(
            "❌ You need at least **{}** {} to exchange!",
            minimum,
            tier.emoji()
        )),
        GameError::UnknownSpecies(name) => Reply::text(format!(
            "❌ Unknown squirrel: **{}**. Check `{}bestiary` for names.",
            name, prefix
        )),
        GameError::NothingToSell(name) => {
            Reply::text(format!("❌ You don't have any **{}** to sell!", name))
        }
        GameError::UnknownItem(name) => Reply::text(format!(
            "❌ Unknown item: **{}**. Check `{}shop` for what's on sale.",
            name, prefix
        )),
        GameError::MaxTier(name) => {
            Reply::text(format!("❌ Your **{}** is already at max tier!", name))
        }
        _ => Reply::text(GENERIC_FAILURE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::JUNK;
    use crate::game::types::BuffKind;

    #[test]
    fn cooldown_is_ephemeral() {
        let reply = error(&GameError::Cooldown { remaining_secs: 7 }, "!sq ");
        assert!(reply.ephemeral);
        assert!(reply.to_plain_text().contains("**7s**"));
    }

    #[test]
    fn internal_errors_are_masked() {
        let reply = error(&GameError::NotFound("buff: 9".into()), "!sq ");
        assert_eq!(reply.content.as_deref(), Some(GENERIC_FAILURE));
    }

    #[test]
    fn catch_reply_has_suspense_and_level_up() {
        let report = CatchReport {
            outcome: RollOutcome::Junk(&JUNK[0]),
            xp_gained: 1,
            levels_gained: 1,
            level: 2,
            junk_chance: 28,
            charges_used: vec![],
        };
        let reply = catch_result(&report);
        assert_eq!(reply.suspense.as_deref(), Some(SUSPENSE_LINE));
        let embed = reply.embed.unwrap();
        assert!(embed.title.contains(JUNK[0].name));
        assert_eq!(embed.fields[0].name, "🎉 LEVEL UP!");
    }

    #[test]
    fn leaderboard_uses_medals_then_numbers() {
        let entries: Vec<LeaderboardEntry> = (1..=4)
            .map(|rank| LeaderboardEntry {
                rank,
                user_id: rank.to_string(),
                label: format!("P{}", rank),
                total_value: 1000 - rank as u64,
                total_catches: 1,
                level: 1,
            })
            .collect();
        let text = leaderboard(&entries).to_plain_text();
        assert!(text.contains("🥇 **P1**"));
        assert!(text.contains("**4.** **P4**"));
    }

    #[test]
    fn buff_list_shows_what_is_left() {
        let now = Utc::now();
        let buff = BuffRecord {
            id: 1,
            user_id: "u".into(),
            kind: BuffKind::LuckyAcorn,
            charges_left: Some(7),
            expires_at: None,
            channel_id: None,
            last_triggered: None,
            created_at: now,
            schema_version: 1,
        };
        let text = buff_list(&[buff], now).to_plain_text();
        assert!(text.contains("7 catches left"));
    }
}
