//! Background catches for players holding a hunter buff.
//!
//! The bot calls [`GameEngine::auto_catch_tick`] on a fixed interval. Each tick
//! drops expired buffs first, then fires every hunter whose interval elapsed.

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;

use crate::game::buffs::{is_auto_catch_due, Modifiers};
use crate::game::engine::GameEngine;
use crate::game::errors::GameError;
use crate::game::roll::{roll_catch, RollContext, RollOutcome};
use crate::game::types::BuffKind;

/// One background catch, ready to be announced in `channel_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoCatchNotice {
    pub user_id: String,
    pub label: String,
    pub channel_id: Option<String>,
    pub hunter: BuffKind,
    pub outcome: RollOutcome,
    pub levels_gained: u32,
    pub level: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    pub expired_removed: usize,
    pub notices: Vec<AutoCatchNotice>,
}

impl GameEngine {
    pub fn auto_catch_tick(&self, now: DateTime<Utc>) -> Result<TickSummary, GameError> {
        self.auto_catch_tick_with_rng(&mut rand::thread_rng(), now)
    }

    pub fn auto_catch_tick_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<TickSummary, GameError> {
        let store = self.store();
        let expired_removed = store.cleanup_expired_buffs(now)?;
        if expired_removed > 0 {
            debug!("Removed {} expired buffs", expired_removed);
        }

        let mut notices = Vec::new();
        for hunter in store.get_auto_catch_buffs(now)? {
            if !is_auto_catch_due(&hunter, now) {
                continue;
            }
            let owned = store.get_active_buffs(&hunter.user_id, now)?;
            let mods = Modifiers::for_auto_catch(&owned, hunter.kind, now);
            let mut player = store.get_player(&hunter.user_id)?;
            let outcome = roll_catch(rng, &RollContext::for_player(&player), &mods);
            let (_, levels_gained) = GameEngine::apply_outcome(&mut player, &outcome);
            store.put_player(&player)?;
            store.update_buff_last_triggered(hunter.id, now)?;
            info!(
                "Auto-catch ({}) for {}",
                hunter.kind.key(),
                hunter.user_id
            );
            notices.push(AutoCatchNotice {
                label: player.label(),
                user_id: hunter.user_id,
                channel_id: hunter.channel_id,
                hunter: hunter.kind,
                outcome,
                levels_gained,
                level: player.level,
            });
        }

        Ok(TickSummary {
            expired_removed,
            notices,
        })
    }
}
