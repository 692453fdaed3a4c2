//! # Storage Module - Player and Buff Persistence
//!
//! Sled-backed persistence for the two runtime entities:
//!
//! - **players** tree: one bincode [`PlayerRecord`] per platform user id
//! - **buffs** tree: one bincode [`BuffRecord`] per purchase, keyed by a
//!   big-endian id from sled's monotonic id generator so a plain scan yields
//!   buffs in creation order
//!
//! Every record carries a schema version that is checked on read.
//! Writes flush immediately.

pub mod seed;

use std::path::Path;

use chrono::{DateTime, Utc};
use sled::IVec;

use crate::game::errors::GameError;
use crate::game::types::{
    BuffKind, BuffRecord, PlayerRecord, BUFF_SCHEMA_VERSION, PLAYER_SCHEMA_VERSION,
};

const TREE_PLAYERS: &str = "players";
const TREE_BUFFS: &str = "buffs";

/// Parameters for a new buff row.
#[derive(Debug, Clone)]
pub struct NewBuff {
    pub user_id: String,
    pub kind: BuffKind,
    pub charges: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub channel_id: Option<String>,
}

#[derive(Clone)]
pub struct Store {
    db: sled::Db,
    players: sled::Tree,
    buffs: sled::Tree,
}

impl Store {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        let buffs = db.open_tree(TREE_BUFFS)?;
        Ok(Self { db, players, buffs })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn decode_player(bytes: IVec) -> Result<PlayerRecord, GameError> {
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn decode_buff(bytes: IVec) -> Result<BuffRecord, GameError> {
        let record: BuffRecord = Self::deserialize(bytes)?;
        if record.schema_version != BUFF_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "buff",
                expected: BUFF_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Fetch a player, creating and persisting a default row on first contact.
    pub fn get_player(&self, user_id: &str) -> Result<PlayerRecord, GameError> {
        if let Some(bytes) = self.players.get(user_id.as_bytes())? {
            return Self::decode_player(bytes);
        }
        let record = PlayerRecord::new(user_id);
        self.put_player(&record)?;
        Ok(record)
    }

    /// Fetch a player without creating one.
    pub fn find_player(&self, user_id: &str) -> Result<Option<PlayerRecord>, GameError> {
        match self.players.get(user_id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode_player(bytes)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a player row.
    pub fn put_player(&self, player: &PlayerRecord) -> Result<(), GameError> {
        let mut record = player.clone();
        record.schema_version = PLAYER_SCHEMA_VERSION;
        let bytes = Self::serialize(&record)?;
        self.players.insert(record.user_id.as_bytes(), bytes)?;
        self.players.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn put_raw_player(&self, user_id: &str, bytes: &[u8]) -> Result<(), GameError> {
        self.players.insert(user_id.as_bytes(), bytes)?;
        Ok(())
    }

    /// Every stored player (leaderboard, status).
    pub fn load_all_players(&self) -> Result<Vec<PlayerRecord>, GameError> {
        let mut out = Vec::new();
        for entry in self.players.iter() {
            let (_, bytes) = entry?;
            out.push(Self::decode_player(bytes)?);
        }
        Ok(out)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    // ------------------------------------------------------------------
    // Buffs
    // ------------------------------------------------------------------

    fn buff_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn put_buff(&self, buff: &BuffRecord) -> Result<(), GameError> {
        let bytes = Self::serialize(buff)?;
        self.buffs.insert(Self::buff_key(buff.id), bytes)?;
        self.buffs.flush()?;
        Ok(())
    }

    /// Store a new buff and return its id.
    pub fn add_buff(&self, new: NewBuff, now: DateTime<Utc>) -> Result<u64, GameError> {
        let id = self.db.generate_id()?;
        let record = BuffRecord {
            id,
            user_id: new.user_id,
            kind: new.kind,
            charges_left: new.charges,
            expires_at: new.expires_at,
            channel_id: new.channel_id,
            last_triggered: None,
            created_at: now,
            schema_version: BUFF_SCHEMA_VERSION,
        };
        self.put_buff(&record)?;
        Ok(id)
    }

    pub fn get_buff(&self, id: u64) -> Result<Option<BuffRecord>, GameError> {
        match self.buffs.get(Self::buff_key(id))? {
            Some(bytes) => Ok(Some(Self::decode_buff(bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_buffs<F>(&self, mut keep: F) -> Result<Vec<BuffRecord>, GameError>
    where
        F: FnMut(&BuffRecord) -> bool,
    {
        let mut out = Vec::new();
        for entry in self.buffs.iter() {
            let (_, bytes) = entry?;
            let buff = Self::decode_buff(bytes)?;
            if keep(&buff) {
                out.push(buff);
            }
        }
        Ok(out)
    }

    /// A player's active buffs in creation order.
    pub fn get_active_buffs(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<BuffRecord>, GameError> {
        self.scan_buffs(|b| b.user_id == user_id && b.is_active(now))
    }

    /// Active hunter buffs across all players in creation order.
    pub fn get_auto_catch_buffs(&self, now: DateTime<Utc>) -> Result<Vec<BuffRecord>, GameError> {
        self.scan_buffs(|b| b.kind.is_auto_catch() && b.expires_at.is_some_and(|at| at > now))
    }

    /// Use one charge; the buff is deleted once it reaches zero.
    /// Returns the charges left (`None` if the buff is gone or uncharged).
    pub fn consume_buff_charge(&self, id: u64) -> Result<Option<u32>, GameError> {
        let Some(mut buff) = self.get_buff(id)? else {
            return Ok(None);
        };
        let Some(charges) = buff.charges_left else {
            return Ok(None);
        };
        let left = charges.saturating_sub(1);
        if left == 0 {
            self.delete_buff(id)?;
            return Ok(Some(0));
        }
        buff.charges_left = Some(left);
        self.put_buff(&buff)?;
        Ok(Some(left))
    }

    /// Push a timed buff's expiry out by `extra`, counting from `now` if it already lapsed.
    pub fn extend_buff(
        &self,
        id: u64,
        extra: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, GameError> {
        let Some(mut buff) = self.get_buff(id)? else {
            return Ok(None);
        };
        let start = buff.expires_at.filter(|at| *at > now).unwrap_or(now);
        let expires = start + extra;
        buff.expires_at = Some(expires);
        self.put_buff(&buff)?;
        Ok(Some(expires))
    }

    pub fn update_buff_last_triggered(&self, id: u64, now: DateTime<Utc>) -> Result<(), GameError> {
        let Some(mut buff) = self.get_buff(id)? else {
            return Err(GameError::NotFound(format!("buff: {}", id)));
        };
        buff.last_triggered = Some(now);
        self.put_buff(&buff)
    }

    /// Overwrite a buff's expiry. Returns false when the row is gone.
    pub fn set_buff_expiry(
        &self,
        id: u64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<bool, GameError> {
        let Some(mut buff) = self.get_buff(id)? else {
            return Ok(false);
        };
        buff.expires_at = expires_at;
        self.put_buff(&buff)?;
        Ok(true)
    }

    pub fn delete_buff(&self, id: u64) -> Result<(), GameError> {
        self.buffs.remove(Self::buff_key(id))?;
        self.buffs.flush()?;
        Ok(())
    }

    /// Delete every time-based buff whose expiry has passed. Returns how many went.
    pub fn cleanup_expired_buffs(&self, now: DateTime<Utc>) -> Result<usize, GameError> {
        let expired = self.scan_buffs(|b| b.expires_at.is_some_and(|at| at <= now))?;
        for buff in &expired {
            self.buffs.remove(Self::buff_key(buff.id))?;
        }
        if !expired.is_empty() {
            self.buffs.flush()?;
        }
        Ok(expired.len())
    }
}
