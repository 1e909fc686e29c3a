//! Attendance Ledger - one current entry per `(raid, user)`
//!
//! Thin layer over [`AttendanceStore`](raid_storage::AttendanceStore) that
//! turns conditional-write outcomes into the raid error taxonomy. Writes to a
//! closed or expired raid are refused by storage in the same step as the
//! write itself.

use chrono::{DateTime, Utc};
use raid_storage::{LedgerWrite, RaidStorage};
use raid_types::{AttendanceEntry, AttendanceStatus, RaidError, RaidId, RaidResult, UserId};
use std::sync::Arc;

pub struct AttendanceLedger {
    storage: Arc<dyn RaidStorage>,
}

impl AttendanceLedger {
    pub fn new(storage: Arc<dyn RaidStorage>) -> Self {
        Self { storage }
    }

    /// Replace (or insert) the user's entry with `status` stamped at `at`.
    pub async fn upsert(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        status: AttendanceStatus,
        at: DateTime<Utc>,
    ) -> RaidResult<AttendanceEntry> {
        let write = self
            .storage
            .upsert_attendance(raid_id, user_id, status, at)
            .await?;
        applied(raid_id, write)
    }

    /// First responder first.
    pub async fn entries_for(&self, raid_id: &RaidId) -> RaidResult<Vec<AttendanceEntry>> {
        Ok(self.storage.list_attendance(raid_id).await?)
    }

    /// Drop the user's entry. Returns whether one existed.
    ///
    /// The response path records "No" as `NotGoing` and never calls this.
    pub async fn remove(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> RaidResult<bool> {
        let write = self.storage.remove_attendance(raid_id, user_id, at).await?;
        applied(raid_id, write)
    }
}

fn applied<T>(raid_id: &RaidId, write: LedgerWrite<T>) -> RaidResult<T> {
    match write {
        LedgerWrite::Applied(value) => Ok(value),
        LedgerWrite::RaidMissing => Err(RaidError::RaidNotFound(*raid_id)),
        LedgerWrite::RaidNotOpen => Err(RaidError::RaidClosed(*raid_id)),
    }
}
