//! Response Processor - applies one user's response to a raid
//!
//! Each request runs lookup, expiry gate, status validation, upsert, and the
//! entry re-read while holding a lock keyed on `(raid, user)`. Requests from
//! different users interleave freely; two requests from the same user are
//! applied in the order they take the lock, so the last one wins whole.

use crate::{AttendanceLedger, RaidRegistry};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use raid_types::{Action, AttendanceEntry, AttendanceStatus, RaidError, RaidId, RaidResult, UserId};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

type LockKey = (RaidId, UserId);

pub struct ResponseProcessor {
    registry: Arc<RaidRegistry>,
    ledger: Arc<AttendanceLedger>,
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

impl ResponseProcessor {
    pub fn new(registry: Arc<RaidRegistry>, ledger: Arc<AttendanceLedger>) -> Self {
        Self {
            registry,
            ledger,
            locks: DashMap::new(),
        }
    }

    /// Apply an already-typed status. Returns the refreshed entry set.
    pub async fn respond(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        status: AttendanceStatus,
        as_of: DateTime<Utc>,
    ) -> RaidResult<Vec<AttendanceEntry>> {
        self.process(raid_id, user_id, Ok(status), as_of).await
    }

    /// Apply a raw action verb from the transport (`join`, `leave`, `maybe`, `plus1`).
    ///
    /// An unknown verb fails with `InvalidStatus`, but only after the raid
    /// lookup and expiry gate have passed.
    pub async fn respond_with_verb(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        verb: &str,
        as_of: DateTime<Utc>,
    ) -> RaidResult<Vec<AttendanceEntry>> {
        let status = verb.parse::<Action>().map(|action| action.status());
        self.process(raid_id, user_id, status, as_of).await
    }

    /// Number of `(raid, user)` keys with a live lock.
    pub fn held_locks(&self) -> usize {
        self.locks.len()
    }

    async fn process(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        status: RaidResult<AttendanceStatus>,
        as_of: DateTime<Utc>,
    ) -> RaidResult<Vec<AttendanceEntry>> {
        let lease = KeyLease::new(&self.locks, (*raid_id, user_id.clone()));
        let _guard = lease.lock().await;

        let raid = self.registry.get(raid_id).await?;
        if raid.predates(as_of) {
            debug!(raid_id = %raid_id, user_id = %user_id, as_of = %as_of, "Response stamped before raid opened");
            return Err(RaidError::InvalidRequest(format!(
                "response at {} predates raid opening at {}",
                as_of, raid.created_at
            )));
        }
        if !raid.accepts_responses_at(as_of) {
            debug!(raid_id = %raid_id, user_id = %user_id, "Response after raid closed");
            return Err(RaidError::RaidClosed(*raid_id));
        }
        let status = status?;

        let entry = self.ledger.upsert(raid_id, user_id, status, as_of).await?;
        debug!(
            raid_id = %raid_id,
            user_id = %user_id,
            status = %entry.status,
            "Response recorded"
        );

        self.ledger.entries_for(raid_id).await
    }
}

/// Holds a reference to one key's mutex; removes the map slot on drop once
/// nobody else is holding or waiting on it.
struct KeyLease<'a> {
    locks: &'a DashMap<LockKey, Arc<Mutex<()>>>,
    key: LockKey,
    lock: Arc<Mutex<()>>,
}

impl<'a> KeyLease<'a> {
    fn new(locks: &'a DashMap<LockKey, Arc<Mutex<()>>>, key: LockKey) -> Self {
        let lock = locks.entry(key.clone()).or_default().clone();
        Self { locks, key, lock }
    }

    async fn lock(&self) -> OwnedMutexGuard<()> {
        self.lock.clone().lock_owned().await
    }
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        // The map's copy plus ours
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 2);
    }
}
