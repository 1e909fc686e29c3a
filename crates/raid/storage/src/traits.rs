use crate::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use raid_types::{AttendanceEntry, AttendanceStatus, Raid, RaidId, UserId};

/// Result of a conditional ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerWrite<T> {
    Applied(T),
    /// No raid with that id
    RaidMissing,
    /// Raid is closed or its invite window elapsed at write time
    RaidNotOpen,
}

/// Result of closing a raid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    AlreadyClosed,
}

/// Storage interface for raid records.
#[async_trait]
pub trait RaidStore: Send + Sync {
    /// Insert a new raid and seed its initiator as `Going`, atomically.
    async fn insert_raid(&self, raid: Raid) -> StorageResult<AttendanceEntry>;

    async fn get_raid(&self, raid_id: &RaidId) -> StorageResult<Option<Raid>>;

    /// Transition to `Closed`. Fails with `NotFound` for unknown raids.
    async fn close_raid(&self, raid_id: &RaidId) -> StorageResult<CloseOutcome>;

    /// Raids still `Open` with `as_of < expires_at`, newest first.
    /// A `limit` of zero means unlimited.
    async fn list_open_raids(&self, as_of: DateTime<Utc>, limit: usize)
        -> StorageResult<Vec<Raid>>;

    /// Raids still `Open` whose invite window has elapsed as of `as_of`.
    async fn list_expired_open_raids(&self, as_of: DateTime<Utc>) -> StorageResult<Vec<Raid>>;
}

/// Storage interface for the attendance ledger.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Replace or insert the entry for `(raid_id, user_id)`.
    ///
    /// An existing entry keeps its `first_responded_at` and `sequence`.
    async fn upsert_attendance(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        status: AttendanceStatus,
        at: DateTime<Utc>,
    ) -> StorageResult<LedgerWrite<AttendanceEntry>>;

    /// Entries ordered by `(first_responded_at, sequence)` ascending.
    async fn list_attendance(&self, raid_id: &RaidId) -> StorageResult<Vec<AttendanceEntry>>;

    /// Drop the entry for `(raid_id, user_id)`. `Applied(false)` if absent.
    async fn remove_attendance(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> StorageResult<LedgerWrite<bool>>;
}

/// Storage bundle used by the raid runtime.
pub trait RaidStorage: RaidStore + AttendanceStore + Send + Sync {}

impl<T> RaidStorage for T where T: RaidStore + AttendanceStore + Send + Sync {}
