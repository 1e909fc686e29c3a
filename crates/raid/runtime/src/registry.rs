//! Raid Registry - owns raid records and their lifecycle
//!
//! Creates raids (seeding the initiator as `Going`), looks them up, closes
//! them, and answers "which raids still accept responses" from the invite
//! window alone, independent of whether the expiry sweep has run.

use crate::{Clock, RaidPolicy};
use chrono::{DateTime, Utc};
use raid_storage::{CloseOutcome, RaidStorage, StorageError};
use raid_types::{AttendanceEntry, Raid, RaidError, RaidId, RaidResult, RaidSpec, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct RaidRegistry {
    storage: Arc<dyn RaidStorage>,
    clock: Arc<dyn Clock>,
    policy: RaidPolicy,
}

impl RaidRegistry {
    pub fn new(storage: Arc<dyn RaidStorage>, clock: Arc<dyn Clock>, policy: RaidPolicy) -> Self {
        Self {
            storage,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RaidPolicy {
        &self.policy
    }

    /// Open a raid and seed the initiator's `Going` entry.
    ///
    /// Request validation fails with `InvalidRequest` before anything is stored.
    pub async fn create(
        &self,
        subject: &str,
        boosted: bool,
        invite_window: Duration,
        initiator_id: UserId,
    ) -> RaidResult<(Raid, AttendanceEntry)> {
        let spec = RaidSpec::new(subject, boosted, invite_window, initiator_id)?;
        spec.validate_window(self.policy.min_invite_minutes, self.policy.max_invite_minutes)?;

        let raid = Raid::open(spec, self.clock.now());
        let seeded = self.storage.insert_raid(raid.clone()).await?;

        info!(
            raid_id = %raid.id,
            subject = %raid.subject,
            boosted = raid.boosted,
            initiator = %raid.initiator_id,
            expires_at = %raid.expires_at(),
            "Raid opened"
        );

        Ok((raid, seeded))
    }

    pub async fn get(&self, raid_id: &RaidId) -> RaidResult<Raid> {
        self.storage
            .get_raid(raid_id)
            .await?
            .ok_or(RaidError::RaidNotFound(*raid_id))
    }

    /// Idempotent transition to `Closed`.
    pub async fn close(&self, raid_id: &RaidId) -> RaidResult<()> {
        match self.storage.close_raid(raid_id).await {
            Ok(CloseOutcome::Closed) => {
                info!(raid_id = %raid_id, "Raid closed");
                Ok(())
            }
            Ok(CloseOutcome::AlreadyClosed) => Ok(()),
            Err(StorageError::NotFound(_)) => Err(RaidError::RaidNotFound(*raid_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Raids still accepting responses at `as_of`, newest first.
    pub async fn list_open(&self, as_of: DateTime<Utc>) -> RaidResult<Vec<Raid>> {
        Ok(self.storage.list_open_raids(as_of, 0).await?)
    }

    /// Like [`list_open`](Self::list_open) but capped at `limit` (0 = unlimited).
    pub async fn list_recent_open(&self, as_of: DateTime<Utc>, limit: usize) -> RaidResult<Vec<Raid>> {
        Ok(self.storage.list_open_raids(as_of, limit).await?)
    }

    /// `Open` raids whose window has elapsed; input for the expiry sweep.
    pub async fn list_expired(&self, as_of: DateTime<Utc>) -> RaidResult<Vec<Raid>> {
        Ok(self.storage.list_expired_open_raids(as_of).await?)
    }
}
