//! Storage backend selection

use crate::config::StorageConfig;
use crate::error::DaemonResult;
use raid_storage::postgres::PostgresRaidStorage;
use raid_storage::{InMemoryRaidStorage, RaidStorage};
use std::sync::Arc;

/// The storage the daemon runs on, kept typed so it can be closed on shutdown.
pub enum StorageBackend {
    Memory(Arc<InMemoryRaidStorage>),
    Postgres(Arc<PostgresRaidStorage>),
}

impl StorageBackend {
    pub async fn connect(config: &StorageConfig) -> DaemonResult<Self> {
        match config {
            StorageConfig::Memory => {
                tracing::warn!("Using in-memory storage; raids are lost on exit");
                Ok(StorageBackend::Memory(Arc::new(InMemoryRaidStorage::new())))
            }
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => {
                let storage =
                    PostgresRaidStorage::connect(url, *max_connections, *connect_timeout_secs)
                        .await?;
                tracing::info!(max_connections = *max_connections, "Connected to PostgreSQL");
                Ok(StorageBackend::Postgres(Arc::new(storage)))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StorageBackend::Memory(_) => "memory",
            StorageBackend::Postgres(_) => "postgres",
        }
    }

    pub fn storage(&self) -> Arc<dyn RaidStorage> {
        match self {
            StorageBackend::Memory(storage) => storage.clone(),
            StorageBackend::Postgres(storage) => storage.clone(),
        }
    }

    pub async fn close(&self) {
        if let StorageBackend::Postgres(storage) = self {
            storage.close().await;
        }
    }
}
