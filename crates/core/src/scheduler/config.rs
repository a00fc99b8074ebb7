//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the periodic check scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Start the scheduler with the server.
    /// When disabled, checks only run on request via the API.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Poll interval used until one is saved in settings (minutes).
    #[serde(default = "default_poll_interval")]
    pub default_poll_interval_minutes: u64,

    /// Floor applied to any poll interval (minutes).
    #[serde(default = "default_min_poll_interval")]
    pub min_poll_interval_minutes: u64,

    /// Ceiling applied to any poll interval (minutes).
    #[serde(default = "default_max_poll_interval")]
    pub max_poll_interval_minutes: u64,

    /// Delay before the initial check after start (seconds).
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    30
}

fn default_min_poll_interval() -> u64 {
    5
}

fn default_max_poll_interval() -> u64 {
    7 * 24 * 60 // one week
}

fn default_initial_delay() -> u64 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            default_poll_interval_minutes: default_poll_interval(),
            min_poll_interval_minutes: default_min_poll_interval(),
            max_poll_interval_minutes: default_max_poll_interval(),
            initial_delay_secs: default_initial_delay(),
        }
    }
}

impl SchedulerConfig {
    /// Clamp a requested interval into the configured floor and ceiling.
    /// The floor wins if the two are inverted.
    pub fn clamp_interval(&self, minutes: u64) -> u64 {
        minutes
            .min(self.max_poll_interval_minutes)
            .max(self.min_poll_interval_minutes)
    }

    /// Clamp a signed interval, as read back from settings.
    pub fn clamp_signed_interval(&self, minutes: i64) -> u64 {
        self.clamp_interval(u64::try_from(minutes).unwrap_or(0))
    }
}
