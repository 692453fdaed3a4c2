use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const BUFF_SCHEMA_VERSION: u8 = 1;

/// Rarity ladder for the species catalog, lowest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
        }
    }

    /// Embed colour used when announcing a catch of this rarity.
    pub fn color(self) -> u32 {
        match self {
            Rarity::Common => 0x808080,
            Rarity::Uncommon => 0x2ECC71,
            Rarity::Rare => 0x3498DB,
            Rarity::Epic => 0x9B59B6,
            Rarity::Legendary => 0xF1C40F,
            Rarity::Mythic => 0xE74C3C,
        }
    }

    pub fn xp(self) -> u64 {
        match self {
            Rarity::Common => 5,
            Rarity::Uncommon => 10,
            Rarity::Rare => 20,
            Rarity::Epic => 40,
            Rarity::Legendary => 80,
            Rarity::Mythic => 200,
        }
    }

    /// Rare and above receive the level, trap, and buff weight bonuses.
    pub fn is_rare_tier(self) -> bool {
        self >= Rarity::Rare
    }

    /// Epic and above get a celebratory footer.
    pub fn is_showcase(self) -> bool {
        self >= Rarity::Epic
    }
}

/// The four acorn denominations, lowest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyTier {
    Acorn,
    Silver,
    Emerald,
    Golden,
}

impl CurrencyTier {
    pub const ALL: [CurrencyTier; 4] = [
        CurrencyTier::Acorn,
        CurrencyTier::Silver,
        CurrencyTier::Emerald,
        CurrencyTier::Golden,
    ];

    /// Value of one unit expressed in plain acorns.
    pub fn rate(self) -> u64 {
        match self {
            CurrencyTier::Acorn => 1,
            CurrencyTier::Silver => 100,
            CurrencyTier::Emerald => 1_000,
            CurrencyTier::Golden => 10_000,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            CurrencyTier::Acorn => "🌰",
            CurrencyTier::Silver => "🥈🌰",
            CurrencyTier::Emerald => "💚🌰",
            CurrencyTier::Golden => "✨🌰",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CurrencyTier::Acorn => "Acorns",
            CurrencyTier::Silver => "Silver Acorns",
            CurrencyTier::Emerald => "Emerald Acorns",
            CurrencyTier::Golden => "Golden Acorns",
        }
    }
}

/// One of the three permanent upgrade ladders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeLadder {
    Trap,
    JunkResist,
    AcornMagnet,
}

impl UpgradeLadder {
    pub const ALL: [UpgradeLadder; 3] = [
        UpgradeLadder::Trap,
        UpgradeLadder::JunkResist,
        UpgradeLadder::AcornMagnet,
    ];

    pub fn key(self) -> &'static str {
        match self {
            UpgradeLadder::Trap => "trap",
            UpgradeLadder::JunkResist => "junk",
            UpgradeLadder::AcornMagnet => "magnet",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UpgradeLadder::Trap => "Sturdy Trap",
            UpgradeLadder::JunkResist => "Junk Filter",
            UpgradeLadder::AcornMagnet => "Acorn Magnet",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            UpgradeLadder::Trap => "🪤",
            UpgradeLadder::JunkResist => "🧹",
            UpgradeLadder::AcornMagnet => "🧲",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match normalize_key(raw).as_str() {
            "trap" | "sturdy_trap" => Some(UpgradeLadder::Trap),
            "junk" | "junk_resist" | "junk_filter" => Some(UpgradeLadder::JunkResist),
            "magnet" | "acorn_magnet" => Some(UpgradeLadder::AcornMagnet),
            _ => None,
        }
    }
}

/// Temporary boosts sold in the shop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    LuckyAcorn,
    AcornDoubler,
    JunkRepellent,
    QuickTrap,
    SquirrelHunter,
    EliteHunter,
}

impl BuffKind {
    pub const ALL: [BuffKind; 6] = [
        BuffKind::LuckyAcorn,
        BuffKind::AcornDoubler,
        BuffKind::JunkRepellent,
        BuffKind::QuickTrap,
        BuffKind::SquirrelHunter,
        BuffKind::EliteHunter,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BuffKind::LuckyAcorn => "lucky_acorn",
            BuffKind::AcornDoubler => "acorn_doubler",
            BuffKind::JunkRepellent => "junk_repellent",
            BuffKind::QuickTrap => "quick_trap",
            BuffKind::SquirrelHunter => "squirrel_hunter",
            BuffKind::EliteHunter => "elite_hunter",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuffKind::LuckyAcorn => "Lucky Acorn",
            BuffKind::AcornDoubler => "Acorn Doubler",
            BuffKind::JunkRepellent => "Junk Repellent",
            BuffKind::QuickTrap => "Quick Trap",
            BuffKind::SquirrelHunter => "Squirrel Hunter",
            BuffKind::EliteHunter => "Elite Hunter",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            BuffKind::LuckyAcorn => "🍀",
            BuffKind::AcornDoubler => "✖️2️⃣",
            BuffKind::JunkRepellent => "🧴",
            BuffKind::QuickTrap => "⚡",
            BuffKind::SquirrelHunter => "🏹",
            BuffKind::EliteHunter => "🎯",
        }
    }

    /// Accepts the key or the display name, case-insensitive.
    pub fn from_key(raw: &str) -> Option<Self> {
        let wanted = normalize_key(raw);
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == wanted || normalize_key(kind.name()) == wanted)
    }

    pub fn is_auto_catch(self) -> bool {
        matches!(self, BuffKind::SquirrelHunter | BuffKind::EliteHunter)
    }
}

/// Lowercase and fold spaces/dashes into underscores so "Lucky Acorn",
/// "lucky-acorn" and "lucky_acorn" all match.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Persistent player state keyed by platform user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub acorns: u64,
    pub silver_acorns: u64,
    pub emerald_acorns: u64,
    pub golden_acorns: u64,
    #[serde(default)]
    pub catches: HashMap<String, u64>,
    pub total_catches: u64,
    pub junk_catches: u64,
    pub level: u32,
    pub xp: u64,
    #[serde(default)]
    pub last_daily: Option<DateTime<Utc>>,
    pub trap_tier: u8,
    pub junk_resist_tier: u8,
    pub acorn_magnet_tier: u8,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: None,
            acorns: 0,
            silver_acorns: 0,
            emerald_acorns: 0,
            golden_acorns: 0,
            catches: HashMap::new(),
            total_catches: 0,
            junk_catches: 0,
            level: 1,
            xp: 0,
            last_daily: None,
            trap_tier: 0,
            junk_resist_tier: 0,
            acorn_magnet_tier: 0,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn balance(&self, tier: CurrencyTier) -> u64 {
        match tier {
            CurrencyTier::Acorn => self.acorns,
            CurrencyTier::Silver => self.silver_acorns,
            CurrencyTier::Emerald => self.emerald_acorns,
            CurrencyTier::Golden => self.golden_acorns,
        }
    }

    pub fn balance_mut(&mut self, tier: CurrencyTier) -> &mut u64 {
        match tier {
            CurrencyTier::Acorn => &mut self.acorns,
            CurrencyTier::Silver => &mut self.silver_acorns,
            CurrencyTier::Emerald => &mut self.emerald_acorns,
            CurrencyTier::Golden => &mut self.golden_acorns,
        }
    }

    pub fn tier(&self, ladder: UpgradeLadder) -> u8 {
        match ladder {
            UpgradeLadder::Trap => self.trap_tier,
            UpgradeLadder::JunkResist => self.junk_resist_tier,
            UpgradeLadder::AcornMagnet => self.acorn_magnet_tier,
        }
    }

    pub fn tier_mut(&mut self, ladder: UpgradeLadder) -> &mut u8 {
        match ladder {
            UpgradeLadder::Trap => &mut self.trap_tier,
            UpgradeLadder::JunkResist => &mut self.junk_resist_tier,
            UpgradeLadder::AcornMagnet => &mut self.acorn_magnet_tier,
        }
    }

    /// Number of distinct species ever kept in the bag.
    pub fn unique_species(&self) -> usize {
        self.catches.values().filter(|&&count| count > 0).count()
    }

    /// Name shown on the leaderboard when the platform name is unknown.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => {
                let short: String = self.user_id.chars().take(6).collect();
                format!("User {}", short)
            }
        }
    }
}

/// A purchased boost. Charge buffs carry `charges_left`, timed buffs carry `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuffRecord {
    pub id: u64,
    pub user_id: String,
    pub kind: BuffKind,
    pub charges_left: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub channel_id: Option<String>,
    pub last_triggered: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl BuffRecord {
    /// Active while it has charges (or is uncharged) and has not expired (or never expires).
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        let charged = self.charges_left.map_or(true, |c| c > 0);
        let unexpired = self.expires_at.map_or(true, |at| at > now);
        charged && unexpired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn buff(charges: Option<u32>, expires_at: Option<DateTime<Utc>>) -> BuffRecord {
        BuffRecord {
            id: 1,
            user_id: "42".into(),
            kind: BuffKind::LuckyAcorn,
            charges_left: charges,
            expires_at,
            channel_id: None,
            last_triggered: None,
            created_at: Utc::now(),
            schema_version: BUFF_SCHEMA_VERSION,
        }
    }

    #[test]
    fn buff_activity_window() {
        let now = Utc::now();
        assert!(buff(Some(3), None).is_active(now));
        assert!(!buff(Some(0), None).is_active(now));
        assert!(buff(None, Some(now + Duration::minutes(1))).is_active(now));
        assert!(!buff(None, Some(now)).is_active(now));
        assert!(buff(None, None).is_active(now));
    }

    #[test]
    fn keys_are_forgiving() {
        assert_eq!(BuffKind::from_key("Lucky Acorn"), Some(BuffKind::LuckyAcorn));
        assert_eq!(BuffKind::from_key("elite-hunter"), Some(BuffKind::EliteHunter));
        assert_eq!(BuffKind::from_key("  QUICK_trap "), Some(BuffKind::QuickTrap));
        assert_eq!(BuffKind::from_key("golden shovel"), None);
        assert_eq!(UpgradeLadder::from_key("Acorn Magnet"), Some(UpgradeLadder::AcornMagnet));
        assert_eq!(UpgradeLadder::from_key("junk"), Some(UpgradeLadder::JunkResist));
    }

    #[test]
    fn label_falls_back_to_short_id() {
        let mut p = PlayerRecord::new("123456789012");
        assert_eq!(p.label(), "User 123456");
        p.display_name = Some("Hazel".into());
        assert_eq!(p.label(), "Hazel");
    }

    #[test]
    fn rare_tier_starts_at_rare() {
        assert!(!Rarity::Uncommon.is_rare_tier());
        assert!(Rarity::Rare.is_rare_tier());
        assert!(Rarity::Mythic.is_rare_tier());
        assert!(!Rarity::Rare.is_showcase());
        assert!(Rarity::Epic.is_showcase());
    }
}
