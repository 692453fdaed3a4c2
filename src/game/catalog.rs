//! Static species and junk tables.
//!
//! Weights are relative; only their ratio matters. Acorn ranges are inclusive
//! and are scaled by level and modifiers at roll time (see [`crate::game::roll`]).

use crate::game::types::Rarity;

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: &'static str,
    pub emoji: &'static str,
    pub rarity: Rarity,
    pub min_acorns: u64,
    pub max_acorns: u64,
    pub weight: f64,
}

impl Species {
    /// Price paid by `sell`: midpoint of the acorn range, rounded down.
    pub fn sell_value(&self) -> u64 {
        (self.min_acorns + self.max_acorns) / 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Junk {
    pub name: &'static str,
    pub emoji: &'static str,
    pub acorns: u64,
}

const fn species(
    name: &'static str,
    emoji: &'static str,
    rarity: Rarity,
    min_acorns: u64,
    max_acorns: u64,
    weight: f64,
) -> Species {
    Species {
        name,
        emoji,
        rarity,
        min_acorns,
        max_acorns,
        weight,
    }
}

pub const SPECIES: &[Species] = &[
    species("Grey Squirrel", "🐿️", Rarity::Common, 1, 5, 40.0),
    species("Red Squirrel", "🐿️", Rarity::Common, 2, 8, 30.0),
    species("Chipmunk", "🐿️", Rarity::Common, 1, 4, 35.0),
    species("Black Squirrel", "🖤🐿️", Rarity::Uncommon, 5, 15, 18.0),
    species("White Squirrel", "🤍🐿️", Rarity::Uncommon, 8, 20, 12.0),
    species("Fox Squirrel", "🦊🐿️", Rarity::Uncommon, 6, 18, 15.0),
    species("Flying Squirrel", "🪂🐿️", Rarity::Rare, 15, 40, 7.0),
    species("Albino Squirrel", "👻🐿️", Rarity::Rare, 20, 50, 5.0),
    species("Giant Squirrel", "💪🐿️", Rarity::Rare, 25, 60, 4.0),
    species("Crystal Squirrel", "💎🐿️", Rarity::Epic, 50, 120, 2.0),
    species("Shadow Squirrel", "🌑🐿️", Rarity::Epic, 60, 150, 1.5),
    species("Golden Squirrel", "👑🐿️", Rarity::Legendary, 150, 400, 0.5),
    species("Cosmic Squirrel", "🌌🐿️", Rarity::Legendary, 200, 500, 0.3),
    species("Mythic Nutcracker", "⚡🐿️", Rarity::Mythic, 500, 1200, 0.1),
];

pub const JUNK: &[Junk] = &[
    Junk { name: "an empty acorn shell", emoji: "🥜", acorns: 0 },
    Junk { name: "a pinecone", emoji: "🌲", acorns: 1 },
    Junk { name: "a leaf", emoji: "🍂", acorns: 0 },
    Junk { name: "a stick", emoji: "🪵", acorns: 1 },
    Junk { name: "a muddy walnut", emoji: "💩", acorns: 2 },
    Junk { name: "a tiny mushroom", emoji: "🍄", acorns: 1 },
    Junk { name: "an old bird feather", emoji: "🪶", acorns: 1 },
    Junk { name: "a shiny pebble", emoji: "🪨", acorns: 2 },
    Junk { name: "nothing! The trap was empty", emoji: "💨", acorns: 0 },
    Junk { name: "a confused frog", emoji: "🐸", acorns: 3 },
];

/// Exact-name lookup used when reading bag contents.
pub fn species_by_name(name: &str) -> Option<&'static Species> {
    SPECIES.iter().find(|s| s.name == name)
}

/// Case-insensitive lookup used for player input (`sell white squirrel`).
pub fn find_species(input: &str) -> Option<&'static Species> {
    let wanted = input.trim();
    SPECIES.iter().find(|s| s.name.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ranges_are_sane() {
        for s in SPECIES {
            assert!(s.min_acorns <= s.max_acorns, "{}", s.name);
            assert!(s.weight > 0.0, "{}", s.name);
        }
        assert_eq!(SPECIES.len(), 14);
        assert_eq!(JUNK.len(), 10);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find_species("white squirrel").map(|s| s.name), Some("White Squirrel"));
        assert_eq!(find_species("  CHIPMUNK ").map(|s| s.name), Some("Chipmunk"));
        assert!(find_species("Arctic Squirrel").is_none());
    }

    #[test]
    fn sell_value_is_range_midpoint() {
        let grey = species_by_name("Grey Squirrel").unwrap();
        assert_eq!(grey.sell_value(), 3);
        let mythic = species_by_name("Mythic Nutcracker").unwrap();
        assert_eq!(mythic.sell_value(), 850);
    }
}
