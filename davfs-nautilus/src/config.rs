use std::path::PathBuf;
use std::time::Duration;

use davfs_integrations::ids::DEFAULT_MOUNT_TABLE;
use serde::Serialize;

use crate::mounts::{DEFAULT_REFRESH_INTERVAL, MountFilter};

pub const ENV_MOUNT_TABLE: &str = "DAVFS_MOUNT_TABLE";
pub const ENV_MOUNT_TTL_MS: &str = "DAVFS_MOUNT_TTL_MS";
pub const ENV_MATCH_ANY_FUSE: &str = "DAVFS_MATCH_ANY_FUSE";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusConfig {
    pub mount_table: PathBuf,
    pub refresh_interval_ms: u64,
    pub mount_filter: MountFilter,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            mount_table: PathBuf::from(DEFAULT_MOUNT_TABLE),
            refresh_interval_ms: default_refresh_ms(),
            mount_filter: MountFilter::default(),
        }
    }
}

impl StatusConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mount_table = lookup(ENV_MOUNT_TABLE)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MOUNT_TABLE));
        let refresh_interval_ms = read_u64(lookup(ENV_MOUNT_TTL_MS), default_refresh_ms());
        let mount_filter = if read_bool(lookup(ENV_MATCH_ANY_FUSE), false) {
            MountFilter::AnyFuse
        } else {
            MountFilter::DriverOnly
        };

        Self {
            mount_table,
            refresh_interval_ms,
            mount_filter,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn default_refresh_ms() -> u64 {
    u64::try_from(DEFAULT_REFRESH_INTERVAL.as_millis()).unwrap_or(5_000)
}

fn read_u64(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn read_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> StatusConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StatusConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_match_proc_mounts_and_five_seconds() {
        let config = config_from(&[]);
        assert_eq!(config, StatusConfig::default());
        assert_eq!(config.mount_table, PathBuf::from("/proc/mounts"));
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.mount_filter, MountFilter::DriverOnly);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            (ENV_MOUNT_TABLE, "/tmp/mounts"),
            (ENV_MOUNT_TTL_MS, "250"),
            (ENV_MATCH_ANY_FUSE, "Yes"),
        ]);
        assert_eq!(config.mount_table, PathBuf::from("/tmp/mounts"));
        assert_eq!(config.refresh_interval(), Duration::from_millis(250));
        assert_eq!(config.mount_filter, MountFilter::AnyFuse);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            (ENV_MOUNT_TABLE, "  "),
            (ENV_MOUNT_TTL_MS, "0"),
            (ENV_MATCH_ANY_FUSE, "maybe"),
        ]);
        assert_eq!(config, StatusConfig::default());
        assert_eq!(read_u64(Some("abc".into()), 7), 7);
    }
}
