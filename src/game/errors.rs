use thiserror::Error;

use crate::game::types::CurrencyTier;

/// Errors raised by the game engine and its sled-backed store.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around JSON errors (seed files).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, seed files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when a record is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Manual catch attempted before the trap recharged.
    #[error("trap is recharging ({remaining_secs}s left)")]
    Cooldown { remaining_secs: u64 },

    /// Daily bonus already claimed inside the current window.
    #[error("daily already claimed ({hours}h {minutes}m left)")]
    DailyClaimed { hours: i64, minutes: i64 },

    /// Not enough of a currency tier for an exchange or purchase.
    #[error("insufficient {tier:?}: have {have}, need {need}")]
    InsufficientFunds {
        tier: CurrencyTier,
        have: u64,
        need: u64,
    },

    /// Exchange amount too small to produce one unit of the next tier.
    #[error("need at least {minimum} {tier:?} to exchange")]
    BelowExchangeMinimum { tier: CurrencyTier, minimum: u64 },

    /// Species name that is not in the catalog.
    #[error("unknown squirrel: {0}")]
    UnknownSpecies(String),

    /// Species exists but the player has none in their bag.
    #[error("no {0} in bag")]
    NothingToSell(String),

    /// Shop item or upgrade ladder that does not exist.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Upgrade ladder already at its final tier.
    #[error("{0} is already at max tier")]
    MaxTier(&'static str),
}

impl GameError {
    /// True for validation failures that should be shown to the player verbatim.
    /// Everything else is an internal failure that gets logged and masked.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            GameError::Cooldown { .. }
                | GameError::DailyClaimed { .. }
                | GameError::InsufficientFunds { .. }
                | GameError::BelowExchangeMinimum { .. }
                | GameError::UnknownSpecies(_)
                | GameError::NothingToSell(_)
                | GameError::UnknownItem(_)
                | GameError::MaxTier(_)
        )
    }
}
