use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Seconds the cron lock is held before it self-expires. Bounds how
    /// long a lock left behind by a crashed run blocks the next one.
    /// Default: 300
    #[serde(default = "default_lock_duration_secs")]
    pub lock_duration_secs: u64,

    /// Seconds between worker wake-ups looking for due tenants.
    /// Default: 60
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Tenants the worker drives.
    /// Default: ["default"]
    #[serde(default = "default_tenants")]
    pub tenants: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            lock_duration_secs: default_lock_duration_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            tenants: default_tenants(),
        }
    }
}

impl JobConfig {
    pub fn lock_duration(&self) -> Duration {
        Duration::from_secs(self.lock_duration_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_lock_duration_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_tenants() -> Vec<String> {
    vec!["default".to_string()]
}
