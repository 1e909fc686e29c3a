//! Expiry Scheduler - periodic backstop closing raids past their window
//!
//! Responses are already gated on the window at request time, so a late or
//! missed sweep never lets a response in. The sweep only makes the `Closed`
//! state visible in storage and listings.

use crate::{Clock, RaidRegistry};
use chrono::{DateTime, Utc};
use raid_types::{RaidId, RaidResult};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Outcome of one sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub closed: Vec<RaidId>,
    pub failed: Vec<RaidId>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.failed.is_empty()
    }
}

pub struct ExpiryScheduler {
    registry: Arc<RaidRegistry>,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
    trigger_tx: mpsc::Sender<()>,
    running: Arc<RwLock<bool>>,
}

impl ExpiryScheduler {
    /// Returns the scheduler and the trigger receiver to hand to [`start`](Self::start).
    pub fn new(
        registry: Arc<RaidRegistry>,
        clock: Arc<dyn Clock>,
        sweep_interval: Duration,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (trigger_tx, trigger_rx) = mpsc::channel(10);

        let scheduler = Arc::new(Self {
            registry,
            clock,
            sweep_interval,
            trigger_tx,
            running: Arc::new(RwLock::new(true)),
        });

        (scheduler, trigger_rx)
    }

    /// Request an immediate sweep.
    pub async fn trigger_sweep(&self) {
        let _ = self.trigger_tx.send(()).await;
    }

    /// False once [`stop`](Self::stop) has been called.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run the sweep loop until [`stop`](Self::stop) is called. Returns
    /// without sweeping if `stop` already ran.
    pub async fn start(self: Arc<Self>, mut trigger_rx: mpsc::Receiver<()>) {
        tracing::info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Expiry scheduler started"
        );

        let mut ticker = interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                Some(_) = trigger_rx.recv() => {}
                else => break,
            }

            if !*self.running.read().await {
                break;
            }

            if let Err(e) = self.sweep_once(self.clock.now()).await {
                tracing::error!(error = %e, "Expiry sweep failed");
            }
        }

        tracing::info!("Expiry scheduler stopped");
    }

    /// Stop the loop. Wakes it so shutdown does not wait a full interval.
    pub async fn stop(&self) {
        {
            let mut running = self.running.write().await;
            *running = false;
        }
        let _ = self.trigger_tx.try_send(());
    }

    /// Close every `Open` raid whose window ended before `now`.
    ///
    /// A failure closing one raid is logged and does not stop the rest.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> RaidResult<SweepReport> {
        let expired = self.registry.list_expired(now).await?;
        let mut report = SweepReport::default();

        for raid in expired {
            match self.registry.close(&raid.id).await {
                Ok(()) => report.closed.push(raid.id),
                Err(e) => {
                    tracing::error!(raid_id = %raid.id, error = %e, "Failed to close expired raid");
                    report.failed.push(raid.id);
                }
            }
        }

        if !report.is_empty() {
            tracing::info!(
                closed = report.closed.len(),
                failed = report.failed.len(),
                "Expiry sweep finished"
            );
        }

        Ok(report)
    }
}
