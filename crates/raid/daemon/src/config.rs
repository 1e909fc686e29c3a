//! Configuration for raidd

use crate::error::{DaemonError, DaemonResult};
use raid_runtime::{OrderingPolicy, RaidPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaiddConfig {
    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Expiry sweep
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Raid creation and listing rules
    #[serde(default)]
    pub raids: RaidsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage, lost on exit
    #[default]
    Memory,

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between expiry sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidsConfig {
    #[serde(default = "default_min_invite")]
    pub min_invite_minutes: u64,

    #[serde(default = "default_max_invite")]
    pub max_invite_minutes: u64,

    /// Used when `open` is called without `--minutes`
    #[serde(default = "default_invite")]
    pub default_invite_minutes: u64,

    /// Raids shown by `list`, 0 for all
    #[serde(default = "default_listing_limit")]
    pub open_listing_limit: usize,

    #[serde(default)]
    pub ordering: OrderingPolicy,
}

impl Default for RaidsConfig {
    fn default() -> Self {
        Self {
            min_invite_minutes: default_min_invite(),
            max_invite_minutes: default_max_invite(),
            default_invite_minutes: default_invite(),
            open_listing_limit: default_listing_limit(),
            ordering: OrderingPolicy::default(),
        }
    }
}

impl RaidsConfig {
    /// Invite window for `minutes`, or the configured default.
    ///
    /// Out-of-range values are left for raid creation to reject.
    pub fn invite_window(&self, minutes: Option<u64>) -> Duration {
        let minutes = minutes.unwrap_or(self.default_invite_minutes);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

impl From<&RaidsConfig> for RaidPolicy {
    fn from(raids: &RaidsConfig) -> Self {
        RaidPolicy {
            min_invite_minutes: raids.min_invite_minutes,
            max_invite_minutes: raids.max_invite_minutes,
            default_invite_minutes: raids.default_invite_minutes,
            open_listing_limit: raids.open_listing_limit,
            ordering: raids.ordering,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_min_invite() -> u64 {
    1
}

fn default_max_invite() -> u64 {
    60
}

fn default_invite() -> u64 {
    5
}

fn default_listing_limit() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RaiddConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `RAIDD_`-prefixed environment variables (`RAIDD_SCHEDULER__SWEEP_INTERVAL_SECS`).
    pub fn load(path: Option<&str>) -> DaemonResult<Self> {
        let mut builder = Self::defaults()?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RAIDD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> DaemonResult<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder().add_source(config::Config::try_from(&RaiddConfig::default())?))
    }

    /// Reject settings the runtime cannot honour.
    pub fn validate(&self) -> DaemonResult<()> {
        let raids = &self.raids;
        if raids.min_invite_minutes == 0 {
            return Err(DaemonError::Config(
                "raids.min_invite_minutes must be at least 1".into(),
            ));
        }
        if raids.min_invite_minutes > raids.max_invite_minutes {
            return Err(DaemonError::Config(format!(
                "raids.min_invite_minutes ({}) exceeds raids.max_invite_minutes ({})",
                raids.min_invite_minutes, raids.max_invite_minutes
            )));
        }
        if !(raids.min_invite_minutes..=raids.max_invite_minutes)
            .contains(&raids.default_invite_minutes)
        {
            return Err(DaemonError::Config(format!(
                "raids.default_invite_minutes ({}) is outside [{}, {}]",
                raids.default_invite_minutes, raids.min_invite_minutes, raids.max_invite_minutes
            )));
        }
        if self.scheduler.sweep_interval_secs == 0 {
            return Err(DaemonError::Config(
                "scheduler.sweep_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn policy(&self) -> RaidPolicy {
        RaidPolicy::from(&self.raids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(raw: &str) -> RaiddConfig {
        RaiddConfig::defaults()
            .unwrap()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = RaiddConfig::default();
        assert!(matches!(config.storage, StorageConfig::Memory));
        assert_eq!(config.scheduler.sweep_interval_secs, 30);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_policy_defaults_match_runtime() {
        let policy = RaiddConfig::default().policy();
        let runtime = RaidPolicy::default();
        assert_eq!(policy.min_invite_minutes, runtime.min_invite_minutes);
        assert_eq!(policy.max_invite_minutes, runtime.max_invite_minutes);
        assert_eq!(policy.default_invite_minutes, runtime.default_invite_minutes);
        assert_eq!(policy.open_listing_limit, runtime.open_listing_limit);
        assert_eq!(policy.ordering, runtime.ordering);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = from_toml(
            r#"
            [storage]
            type = "postgres"
            url = "postgres://raids@localhost/raids"

            [raids]
            max_invite_minutes = 30
            ordering = "latest_response"
            "#,
        );

        match config.storage {
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => {
                assert_eq!(url, "postgres://raids@localhost/raids");
                assert_eq!(max_connections, 10);
                assert_eq!(connect_timeout_secs, 5);
            }
            other => panic!("unexpected storage {:?}", other),
        }
        assert_eq!(config.raids.max_invite_minutes, 30);
        assert_eq!(config.raids.min_invite_minutes, 1);
        assert_eq!(config.raids.ordering, OrderingPolicy::LatestResponse);
    }

    #[test]
    fn test_invite_window() {
        let raids = RaidsConfig::default();
        assert_eq!(raids.invite_window(None), Duration::from_secs(5 * 60));
        assert_eq!(raids.invite_window(Some(30)), Duration::from_secs(30 * 60));
        assert_eq!(raids.invite_window(Some(u64::MAX)), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_validate_rejects_bad_window() {
        let mut config = RaiddConfig::default();
        config.raids.default_invite_minutes = 90;
        assert!(matches!(config.validate(), Err(DaemonError::Config(_))));

        let mut config = RaiddConfig::default();
        config.raids.min_invite_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = RaiddConfig::default();
        config.scheduler.sweep_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
