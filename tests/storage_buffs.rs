//! Buff rows in the sled store: charges, expiry and cleanup.

use chrono::{Duration, TimeZone, Utc};
use squirrel_catcher::game::BuffKind;
use squirrel_catcher::storage::{NewBuff, Store};
use tempfile::TempDir;

fn charged(user: &str, kind: BuffKind, charges: u32) -> NewBuff {
    NewBuff {
        user_id: user.to_string(),
        kind,
        charges: Some(charges),
        expires_at: None,
        channel_id: None,
    }
}

#[test]
fn last_charge_deletes_the_row() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let now = Utc::now();
    let id = store.add_buff(charged("5", BuffKind::AcornDoubler, 2), now).unwrap();

    assert_eq!(store.consume_buff_charge(id).unwrap(), Some(1));
    assert_eq!(store.get_buff(id).unwrap().unwrap().charges_left, Some(1));
    assert_eq!(store.consume_buff_charge(id).unwrap(), Some(0));
    assert!(store.get_buff(id).unwrap().is_none());
    assert_eq!(store.consume_buff_charge(id).unwrap(), None);
}

#[test]
fn cleanup_only_touches_lapsed_timed_buffs() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();

    let lapsed = store
        .add_buff(
            NewBuff {
                user_id: "5".into(),
                kind: BuffKind::JunkRepellent,
                charges: None,
                expires_at: Some(now - Duration::seconds(1)),
                channel_id: None,
            },
            now - Duration::minutes(30),
        )
        .unwrap();
    let running = store
        .add_buff(
            NewBuff {
                user_id: "5".into(),
                kind: BuffKind::QuickTrap,
                charges: None,
                expires_at: Some(now + Duration::minutes(10)),
                channel_id: None,
            },
            now,
        )
        .unwrap();
    let lucky = store.add_buff(charged("5", BuffKind::LuckyAcorn, 10), now).unwrap();

    let active: Vec<u64> = store
        .get_active_buffs("5", now)
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(active, vec![running, lucky]);

    assert_eq!(store.cleanup_expired_buffs(now).unwrap(), 1);
    assert!(store.get_buff(lapsed).unwrap().is_none());
    assert!(store.get_buff(running).unwrap().is_some());
    assert!(store.get_buff(lucky).unwrap().is_some());
}
