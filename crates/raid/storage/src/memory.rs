//! In-memory reference implementation of the raid storage traits.
//!
//! Raids and ledgers share one lock so that the "raid still open" check and
//! the ledger write are a single step. Nothing survives a restart; use the
//! PostgreSQL backend for that.

use crate::traits::{AttendanceStore, CloseOutcome, LedgerWrite, RaidStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use raid_types::{AttendanceEntry, AttendanceStatus, Raid, RaidId, RaidState, UserId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct State {
    raids: HashMap<RaidId, Raid>,
    ledgers: HashMap<RaidId, HashMap<UserId, AttendanceEntry>>,
    next_sequence: u64,
}

impl State {
    fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    /// `Some(rejection)` when the raid cannot take ledger writes at `at`.
    fn rejection<T>(&self, raid_id: &RaidId, at: DateTime<Utc>) -> Option<LedgerWrite<T>> {
        match self.raids.get(raid_id) {
            None => Some(LedgerWrite::RaidMissing),
            Some(raid) if !raid.accepts_responses_at(at) => Some(LedgerWrite::RaidNotOpen),
            Some(_) => None,
        }
    }
}

/// In-memory raid storage adapter.
#[derive(Default)]
pub struct InMemoryRaidStorage {
    state: RwLock<State>,
}

impl InMemoryRaidStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StorageError::Backend("raid state lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StorageError::Backend("raid state lock poisoned".to_string()))
    }
}

#[async_trait]
impl RaidStore for InMemoryRaidStorage {
    async fn insert_raid(&self, raid: Raid) -> StorageResult<AttendanceEntry> {
        let mut guard = self.write()?;

        if guard.raids.contains_key(&raid.id) {
            return Err(StorageError::Conflict(format!("raid {} already exists", raid.id)));
        }

        let sequence = guard.next_sequence();
        let entry = AttendanceEntry {
            raid_id: raid.id,
            user_id: raid.initiator_id.clone(),
            status: AttendanceStatus::Going,
            first_responded_at: raid.created_at,
            updated_at: raid.created_at,
            sequence,
        };

        let mut ledger = HashMap::new();
        ledger.insert(entry.user_id.clone(), entry.clone());
        guard.ledgers.insert(raid.id, ledger);
        guard.raids.insert(raid.id, raid);
        Ok(entry)
    }

    async fn get_raid(&self, raid_id: &RaidId) -> StorageResult<Option<Raid>> {
        let guard = self.read()?;
        Ok(guard.raids.get(raid_id).cloned())
    }

    async fn close_raid(&self, raid_id: &RaidId) -> StorageResult<CloseOutcome> {
        let mut guard = self.write()?;
        let raid = guard
            .raids
            .get_mut(raid_id)
            .ok_or_else(|| StorageError::NotFound(format!("raid {} not found", raid_id)))?;

        if raid.state == RaidState::Closed {
            return Ok(CloseOutcome::AlreadyClosed);
        }
        raid.state = RaidState::Closed;
        Ok(CloseOutcome::Closed)
    }

    async fn list_open_raids(
        &self,
        as_of: DateTime<Utc>,
        limit: usize,
    ) -> StorageResult<Vec<Raid>> {
        let guard = self.read()?;
        let mut values = guard
            .raids
            .values()
            .filter(|raid| raid.accepts_responses_at(as_of))
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        if limit > 0 {
            values.truncate(limit);
        }
        Ok(values)
    }

    async fn list_expired_open_raids(&self, as_of: DateTime<Utc>) -> StorageResult<Vec<Raid>> {
        let guard = self.read()?;
        let mut values = guard
            .raids
            .values()
            .filter(|raid| raid.state == RaidState::Open && raid.is_expired_at(as_of))
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(values)
    }
}

#[async_trait]
impl AttendanceStore for InMemoryRaidStorage {
    async fn upsert_attendance(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        status: AttendanceStatus,
        at: DateTime<Utc>,
    ) -> StorageResult<LedgerWrite<AttendanceEntry>> {
        let mut guard = self.write()?;
        if let Some(rejected) = guard.rejection(raid_id, at) {
            return Ok(rejected);
        }

        let existing = guard
            .ledgers
            .get(raid_id)
            .and_then(|ledger| ledger.get(user_id))
            .map(|entry| (entry.first_responded_at, entry.sequence));
        let (first_responded_at, sequence) = match existing {
            Some(kept) => kept,
            None => (at, guard.next_sequence()),
        };

        let entry = AttendanceEntry {
            raid_id: *raid_id,
            user_id: user_id.clone(),
            status,
            first_responded_at,
            updated_at: at,
            sequence,
        };
        guard
            .ledgers
            .entry(*raid_id)
            .or_default()
            .insert(user_id.clone(), entry.clone());
        Ok(LedgerWrite::Applied(entry))
    }

    async fn list_attendance(&self, raid_id: &RaidId) -> StorageResult<Vec<AttendanceEntry>> {
        let guard = self.read()?;
        let mut values = guard
            .ledgers
            .get(raid_id)
            .map(|ledger| ledger.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        values.sort_by(|a, b| {
            a.first_responded_at
                .cmp(&b.first_responded_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok(values)
    }

    async fn remove_attendance(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> StorageResult<LedgerWrite<bool>> {
        let mut guard = self.write()?;
        if let Some(rejected) = guard.rejection(raid_id, at) {
            return Ok(rejected);
        }

        let removed = guard
            .ledgers
            .get_mut(raid_id)
            .map(|ledger| ledger.remove(user_id).is_some())
            .unwrap_or(false);
        Ok(LedgerWrite::Applied(removed))
    }
}
