//! Daemon lifecycle

use crate::config::RaiddConfig;
use crate::error::DaemonResult;
use crate::storage::StorageBackend;
use raid_runtime::{InMemoryProfileDirectory, RaidCoordinator, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// A running raid coordinator with its storage.
pub struct Daemon {
    config: RaiddConfig,
    backend: StorageBackend,
    coordinator: Arc<RaidCoordinator>,
}

impl Daemon {
    pub async fn new(config: RaiddConfig) -> DaemonResult<Self> {
        let backend = StorageBackend::connect(&config.storage).await?;
        // Profile registration lives outside the daemon; everyone renders unregistered.
        let coordinator = Arc::new(RaidCoordinator::new(
            backend.storage(),
            Arc::new(InMemoryProfileDirectory::new()),
            Arc::new(SystemClock),
            config.policy(),
        ));

        Ok(Self {
            config,
            backend,
            coordinator,
        })
    }

    pub fn coordinator(&self) -> Arc<RaidCoordinator> {
        self.coordinator.clone()
    }

    /// Run the expiry sweep until a shutdown signal arrives. The caller
    /// closes storage afterwards with [`shutdown`](Self::shutdown).
    pub async fn run(&self) -> DaemonResult<()> {
        let interval = Duration::from_secs(self.config.scheduler.sweep_interval_secs);
        let (scheduler, trigger_rx) = self.coordinator.expiry_scheduler(interval);
        let sweep = tokio::spawn(scheduler.clone().start(trigger_rx));

        tracing::info!(
            storage = self.backend.kind(),
            sweep_interval_secs = interval.as_secs(),
            "raidd started"
        );

        shutdown_signal().await;

        tracing::info!("raidd shutting down");
        scheduler.stop().await;
        if let Err(e) = sweep.await {
            tracing::error!(error = %e, "Expiry scheduler task failed");
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.backend.close().await;
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
