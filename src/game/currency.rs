/// Currency system implementation - valuation, exchange, and display formatting
use crate::game::errors::GameError;
use crate::game::types::{CurrencyTier, PlayerRecord};

// ============================================================================
// Exchange ladder
// ============================================================================

/// One rung of the one-way exchange ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStep {
    AcornsToSilver,
    SilverToEmerald,
    EmeraldToGolden,
}

impl ExchangeStep {
    pub const ALL: [ExchangeStep; 3] = [
        ExchangeStep::AcornsToSilver,
        ExchangeStep::SilverToEmerald,
        ExchangeStep::EmeraldToGolden,
    ];

    pub fn from_tier(self) -> CurrencyTier {
        match self {
            ExchangeStep::AcornsToSilver => CurrencyTier::Acorn,
            ExchangeStep::SilverToEmerald => CurrencyTier::Silver,
            ExchangeStep::EmeraldToGolden => CurrencyTier::Emerald,
        }
    }

    pub fn to_tier(self) -> CurrencyTier {
        match self {
            ExchangeStep::AcornsToSilver => CurrencyTier::Silver,
            ExchangeStep::SilverToEmerald => CurrencyTier::Emerald,
            ExchangeStep::EmeraldToGolden => CurrencyTier::Golden,
        }
    }

    /// Units of the source tier per unit of the target tier.
    pub fn ratio(self) -> u64 {
        self.to_tier().rate() / self.from_tier().rate()
    }
}

/// Result of a successful exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeReceipt {
    pub step: ExchangeStep,
    pub spent: u64,
    pub gained: u64,
}

/// Convert up to `amount` of the step's source tier. Only whole target units are
/// bought; the remainder of `amount` stays in the source balance.
pub fn exchange(
    player: &mut PlayerRecord,
    step: ExchangeStep,
    amount: u64,
) -> Result<ExchangeReceipt, GameError> {
    let from = step.from_tier();
    let have = player.balance(from);
    if have < amount {
        return Err(GameError::InsufficientFunds {
            tier: from,
            have,
            need: amount,
        });
    }
    let ratio = step.ratio();
    let gained = amount / ratio;
    if gained < 1 {
        return Err(GameError::BelowExchangeMinimum {
            tier: from,
            minimum: ratio,
        });
    }
    let spent = gained * ratio;
    *player.balance_mut(from) -= spent;
    let target = player.balance_mut(step.to_tier());
    *target = target.saturating_add(gained);
    Ok(ExchangeReceipt {
        step,
        spent,
        gained,
    })
}

/// Remove `amount` of one tier, failing without change if the balance is short.
pub fn spend(player: &mut PlayerRecord, tier: CurrencyTier, amount: u64) -> Result<(), GameError> {
    let have = player.balance(tier);
    if have < amount {
        return Err(GameError::InsufficientFunds {
            tier,
            have,
            need: amount,
        });
    }
    *player.balance_mut(tier) -= amount;
    Ok(())
}

/// Net worth in plain acorns across all four tiers.
pub fn total_value(player: &PlayerRecord) -> u64 {
    CurrencyTier::ALL
        .iter()
        .map(|&tier| player.balance(tier).saturating_mul(tier.rate()))
        .fold(0u64, |acc, v| acc.saturating_add(v))
}

// ============================================================================
// Display formatting
// ============================================================================

/// Thousands separators: 12345 -> "12,345".
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// "3 🥈🌰"
pub fn format_price(tier: CurrencyTier, amount: u64) -> String {
    format!("{} {}", group_digits(amount), tier.emoji())
}

/// The exchange-rate card shared by the help menu and bare `exchange`.
pub fn exchange_rates_text(prefix: &str) -> String {
    let mut lines: Vec<String> = ExchangeStep::ALL
        .iter()
        .map(|step| {
            format!(
                "• {} {} {} → 1 {} {}",
                step.ratio(),
                step.from_tier().emoji(),
                step.from_tier().name(),
                step.to_tier().emoji(),
                step.to_tier().name().trim_end_matches('s'),
            )
        })
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "Use `{p}exchange <amount>`, `{p}exchange_silver <amount>` or `{p}exchange_emerald <amount>` to convert.",
        p = prefix
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_follow_rates() {
        assert_eq!(ExchangeStep::AcornsToSilver.ratio(), 100);
        assert_eq!(ExchangeStep::SilverToEmerald.ratio(), 10);
        assert_eq!(ExchangeStep::EmeraldToGolden.ratio(), 10);
    }

    #[test]
    fn digits_are_grouped() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }

    #[test]
    fn rates_card_mentions_every_step() {
        let text = exchange_rates_text("!sq ");
        assert!(text.contains("• 100 🌰 Acorns → 1 🥈🌰 Silver Acorn"));
        assert!(text.contains("• 10 💚🌰 Emerald Acorns → 1 ✨🌰 Golden Acorn"));
        assert!(text.contains("!sq exchange_silver"));
    }
}
