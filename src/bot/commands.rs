//! Command parsing for prefixed chat messages and menu components.
//!
//! Text commands look like `!sq sell grey squirrel`: the configured prefix, a
//! command word (or alias) and free-form arguments. Menu buttons and the select
//! menu use custom ids of the form `sq:<action>`.

use crate::game::currency::ExchangeStep;

/// Custom id prefix shared by every menu component.
pub const COMPONENT_PREFIX: &str = "sq:";
/// Custom id of the "More actions..." select menu.
pub const MENU_SELECT_ID: &str = "sq:menu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Catch,
    Balance,
    Bag,
    Profile,
    Daily,
    Bestiary,
    Leaderboard,
    /// Exchange rate card (menu entry).
    ExchangeRates,
    /// `amount` is `None` when missing, non-numeric or not positive.
    Exchange {
        step: ExchangeStep,
        amount: Option<u64>,
    },
    Sell(Option<String>),
    Shop,
    Buy(Option<String>),
    Upgrade(Option<String>),
    Buffs,
}

impl Command {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Catch => "catch",
            Command::Balance => "balance",
            Command::Bag => "bag",
            Command::Profile => "profile",
            Command::Daily => "daily",
            Command::Bestiary => "bestiary",
            Command::Leaderboard => "leaderboard",
            Command::ExchangeRates => "exchange_rates",
            Command::Exchange { .. } => "exchange",
            Command::Sell(_) => "sell",
            Command::Shop => "shop",
            Command::Buy(_) => "buy",
            Command::Upgrade(_) => "upgrade",
            Command::Buffs => "buffs",
        }
    }
}

fn rest_arg(rest: &str) -> Option<String> {
    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn amount_arg(rest: &str) -> Option<u64> {
    rest.split_whitespace()
        .next()
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as u64)
}

/// Parse a chat message. Returns `None` when the message does not start with
/// `prefix` or names an unknown command; such messages are ignored.
pub fn parse_command(prefix: &str, content: &str) -> Option<Command> {
    let body = content.strip_prefix(prefix)?;
    let body = body.trim_start();
    let (word, rest) = match body.find(char::is_whitespace) {
        Some(idx) => (&body[..idx], &body[idx..]),
        None => (body, ""),
    };

    let cmd = match word.to_lowercase().as_str() {
        "help" => Command::Help,
        "catch" => Command::Catch,
        "balance" | "bal" => Command::Balance,
        "bag" | "inventory" | "inv" => Command::Bag,
        "profile" => Command::Profile,
        "daily" => Command::Daily,
        "bestiary" | "dex" => Command::Bestiary,
        "leaderboard" | "lb" | "top" => Command::Leaderboard,
        "exchange" | "ex" => Command::Exchange {
            step: ExchangeStep::AcornsToSilver,
            amount: amount_arg(rest),
        },
        "exchange_silver" | "exs" => Command::Exchange {
            step: ExchangeStep::SilverToEmerald,
            amount: amount_arg(rest),
        },
        "exchange_emerald" | "exe" => Command::Exchange {
            step: ExchangeStep::EmeraldToGolden,
            amount: amount_arg(rest),
        },
        "sell" => Command::Sell(rest_arg(rest)),
        "shop" => Command::Shop,
        "buy" => Command::Buy(rest_arg(rest)),
        "upgrade" | "up" => Command::Upgrade(rest_arg(rest)),
        "buffs" => Command::Buffs,
        _ => return None,
    };
    Some(cmd)
}

/// Parse a component interaction: a button id, or the select menu id with the
/// chosen value.
pub fn parse_component(custom_id: &str, values: &[String]) -> Option<Command> {
    let action = if custom_id == MENU_SELECT_ID {
        values.first()?.as_str()
    } else {
        custom_id.strip_prefix(COMPONENT_PREFIX)?
    };
    let cmd = match action {
        "catch" => Command::Catch,
        "bag" => Command::Bag,
        "balance" => Command::Balance,
        "profile" => Command::Profile,
        "daily" => Command::Daily,
        "bestiary" => Command::Bestiary,
        "leaderboard" => Command::Leaderboard,
        "shop" => Command::Shop,
        "buffs" => Command::Buffs,
        "exchange" => Command::ExchangeRates,
        "help" => Command::Help,
        _ => return None,
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_prefix() {
        assert_eq!(parse_command("!sq ", "!sq catch"), Some(Command::Catch));
        assert_eq!(parse_command("!sq ", "catch"), None);
        assert_eq!(parse_command("!sq ", "!sqcatch"), None);
    }

    #[test]
    fn unknown_words_are_ignored() {
        assert_eq!(parse_command("!sq ", "!sq dance"), None);
        assert_eq!(parse_command("!sq ", "!sq "), None);
    }

    #[test]
    fn exchange_amounts() {
        assert_eq!(
            parse_command("!sq ", "!sq ex 250"),
            Some(Command::Exchange {
                step: ExchangeStep::AcornsToSilver,
                amount: Some(250)
            })
        );
        for bad in ["!sq exs", "!sq exs -5", "!sq exs 0", "!sq exs lots"] {
            assert_eq!(
                parse_command("!sq ", bad),
                Some(Command::Exchange {
                    step: ExchangeStep::SilverToEmerald,
                    amount: None
                }),
                "{bad}"
            );
        }
    }

    #[test]
    fn menu_select_uses_first_value() {
        assert_eq!(
            parse_component(MENU_SELECT_ID, &["bestiary".to_string()]),
            Some(Command::Bestiary)
        );
        assert_eq!(parse_component(MENU_SELECT_ID, &[]), None);
        assert_eq!(parse_component("sq:catch", &[]), Some(Command::Catch));
        assert_eq!(parse_component("other:catch", &[]), None);
    }
}
