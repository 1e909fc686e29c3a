//! Raid Coordinator - the inbound interface used by a chat transport
//!
//! Wires the registry, ledger, processor and renderer over one storage
//! handle, resolves profiles for each render, and is the single place where
//! outcomes are logged by severity.

use crate::profiles::resolve_profiles;
use crate::{
    AttendanceLedger, Clock, ExpiryScheduler, ListingLine, ProfileDirectory, RaidPolicy,
    RaidRegistry, ResponseProcessor, Summary, SummaryRenderer,
};
use chrono::{DateTime, Utc};
use raid_storage::RaidStorage;
use raid_types::{
    Action, AttendanceEntry, AttendanceStatus, CallbackPayload, Raid, RaidError, RaidId,
    RaidResult, UserId,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// A freshly opened raid and its first summary.
#[derive(Clone, Debug)]
pub struct OpenedRaid {
    pub raid: Raid,
    pub summary: Summary,
}

pub struct RaidCoordinator {
    registry: Arc<RaidRegistry>,
    ledger: Arc<AttendanceLedger>,
    processor: ResponseProcessor,
    renderer: SummaryRenderer,
    profiles: Arc<dyn ProfileDirectory>,
    clock: Arc<dyn Clock>,
}

impl RaidCoordinator {
    pub fn new(
        storage: Arc<dyn RaidStorage>,
        profiles: Arc<dyn ProfileDirectory>,
        clock: Arc<dyn Clock>,
        policy: RaidPolicy,
    ) -> Self {
        let renderer = SummaryRenderer::new(policy.ordering);
        let registry = Arc::new(RaidRegistry::new(storage.clone(), clock.clone(), policy));
        let ledger = Arc::new(AttendanceLedger::new(storage));
        let processor = ResponseProcessor::new(registry.clone(), ledger.clone());

        Self {
            registry,
            ledger,
            processor,
            renderer,
            profiles,
            clock,
        }
    }

    pub fn policy(&self) -> &RaidPolicy {
        self.registry.policy()
    }

    pub fn renderer(&self) -> &SummaryRenderer {
        &self.renderer
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Build the expiry sweep over this coordinator's registry and clock.
    pub fn expiry_scheduler(
        &self,
        sweep_interval: Duration,
    ) -> (Arc<ExpiryScheduler>, mpsc::Receiver<()>) {
        ExpiryScheduler::new(self.registry.clone(), self.clock.clone(), sweep_interval)
    }

    /// Open a raid with the initiator seeded as `Going`.
    pub async fn open_raid(
        &self,
        subject: &str,
        boosted: bool,
        invite_window: Duration,
        initiator_id: UserId,
    ) -> RaidResult<OpenedRaid> {
        let result = async {
            let (raid, seeded) = self
                .registry
                .create(subject, boosted, invite_window, initiator_id)
                .await?;
            let summary = self.render(&raid, &[seeded], raid.created_at).await;
            Ok::<_, RaidError>(OpenedRaid { raid, summary })
        }
        .await;
        observe("open_raid", None, result)
    }

    /// Record `status` for `user_id` and return the refreshed summary.
    pub async fn respond(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        status: AttendanceStatus,
        as_of: DateTime<Utc>,
    ) -> RaidResult<Summary> {
        let result = async {
            let entries = self.processor.respond(raid_id, user_id, status, as_of).await?;
            self.summary_from(raid_id, &entries, as_of).await
        }
        .await;
        observe("respond", Some(raid_id), result)
    }

    pub async fn respond_action(
        &self,
        raid_id: &RaidId,
        user_id: &UserId,
        action: Action,
        as_of: DateTime<Utc>,
    ) -> RaidResult<Summary> {
        self.respond(raid_id, user_id, action.status(), as_of).await
    }

    /// Handle a raw button payload such as `join_<raid>` or `maybe:<raid>`.
    ///
    /// The verb is checked only after the raid is found and still open.
    pub async fn respond_to_payload(
        &self,
        payload: &str,
        user_id: &UserId,
        as_of: DateTime<Utc>,
    ) -> RaidResult<Summary> {
        let payload = match CallbackPayload::parse(payload) {
            Ok(payload) => payload,
            Err(e) => return observe("respond_to_payload", None, Err(e)),
        };
        let result = async {
            let entries = self
                .processor
                .respond_with_verb(&payload.raid_id, user_id, &payload.verb, as_of)
                .await?;
            self.summary_from(&payload.raid_id, &entries, as_of).await
        }
        .await;
        observe("respond_to_payload", Some(&payload.raid_id), result)
    }

    /// Newest raids still accepting responses, capped by the listing limit.
    pub async fn list_open_raids(&self, as_of: DateTime<Utc>) -> RaidResult<Vec<Raid>> {
        let result = self
            .registry
            .list_recent_open(as_of, self.policy().open_listing_limit)
            .await;
        observe("list_open_raids", None, result)
    }

    pub async fn open_raids_listing(&self, as_of: DateTime<Utc>) -> RaidResult<Vec<ListingLine>> {
        let result = async {
            let raids = self
                .registry
                .list_recent_open(as_of, self.policy().open_listing_limit)
                .await?;
            let mut lines = Vec::with_capacity(raids.len());
            for raid in raids {
                let entries = self.ledger.entries_for(&raid.id).await?;
                let profiles =
                    resolve_profiles(self.profiles.as_ref(), &[&raid.initiator_id]).await;
                lines.push(self.renderer.listing_line(&raid, &entries, &profiles, as_of));
            }
            Ok::<_, RaidError>(lines)
        }
        .await;
        observe("open_raids_listing", None, result)
    }

    /// Close a raid now. Closing a closed raid is a no-op.
    pub async fn close_raid(&self, raid_id: &RaidId) -> RaidResult<Summary> {
        let result = async {
            self.registry.close(raid_id).await?;
            let entries = self.ledger.entries_for(raid_id).await?;
            self.summary_from(raid_id, &entries, self.clock.now()).await
        }
        .await;
        observe("close_raid", Some(raid_id), result)
    }

    /// Re-render any raid, open or closed.
    pub async fn summary(&self, raid_id: &RaidId, as_of: DateTime<Utc>) -> RaidResult<Summary> {
        let result = async {
            let entries = self.ledger.entries_for(raid_id).await?;
            self.summary_from(raid_id, &entries, as_of).await
        }
        .await;
        observe("summary", Some(raid_id), result)
    }

    pub async fn entries_for(&self, raid_id: &RaidId) -> RaidResult<Vec<AttendanceEntry>> {
        let result = self.ledger.entries_for(raid_id).await;
        observe("entries_for", Some(raid_id), result)
    }

    async fn summary_from(
        &self,
        raid_id: &RaidId,
        entries: &[AttendanceEntry],
        now: DateTime<Utc>,
    ) -> RaidResult<Summary> {
        let raid = self.registry.get(raid_id).await?;
        Ok(self.render(&raid, entries, now).await)
    }

    async fn render(&self, raid: &Raid, entries: &[AttendanceEntry], now: DateTime<Utc>) -> Summary {
        let users: Vec<&UserId> = std::iter::once(&raid.initiator_id)
            .chain(entries.iter().map(|e| &e.user_id))
            .collect();
        let profiles = resolve_profiles(self.profiles.as_ref(), &users).await;
        self.renderer.render(raid, entries, &profiles, now)
    }
}

/// Log by severity: infrastructure faults as errors, user-facing outcomes at debug.
fn observe<T>(operation: &'static str, raid_id: Option<&RaidId>, result: RaidResult<T>) -> RaidResult<T> {
    if let Err(e) = &result {
        let raid_id = raid_id.map(|id| id.to_string()).unwrap_or_default();
        match e {
            RaidError::StorageFailure(_) => {
                error!(operation, raid_id = %raid_id, error = %e, "Raid operation failed");
            }
            _ => {
                debug!(operation, raid_id = %raid_id, error = %e, "Raid request rejected");
            }
        }
    }
    result
}
