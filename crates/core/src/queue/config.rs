//! Queue configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::carrier::Carrier;

/// Configuration for the rate-limited check queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Minimum spacing for carriers without an entry in `carrier_intervals_secs`.
    #[serde(default = "default_min_interval")]
    pub default_min_interval_secs: u64,

    /// Per-carrier minimum spacing in seconds, keyed by carrier id.
    /// Setting this table replaces the built-in defaults.
    #[serde(default = "default_carrier_intervals")]
    pub carrier_intervals_secs: HashMap<String, u64>,

    /// Upper bound on a carrier's effective interval after backoff.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,

    /// Hard deadline for a single task.
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,

    /// Pause between consecutive tasks, regardless of carrier.
    #[serde(default = "default_inter_task_gap")]
    pub inter_task_gap_ms: u64,
}

fn default_min_interval() -> u64 {
    60
}

fn default_carrier_intervals() -> HashMap<String, u64> {
    [
        ("ups", 30),
        ("fedex", 30),
        ("usps", 30),
        ("dhl", 30),
        ("amazon", 60),
        ("unknown", 30),
    ]
    .into_iter()
    .map(|(carrier, secs)| (carrier.to_string(), secs))
    .collect()
}

fn default_max_backoff() -> u64 {
    4 * 60 * 60 // 4 hours
}

fn default_task_timeout() -> u64 {
    60
}

fn default_inter_task_gap() -> u64 {
    1000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_min_interval_secs: default_min_interval(),
            carrier_intervals_secs: default_carrier_intervals(),
            max_backoff_secs: default_max_backoff(),
            task_timeout_secs: default_task_timeout(),
            inter_task_gap_ms: default_inter_task_gap(),
        }
    }
}

impl QueueConfig {
    /// Base minimum interval between checks for `carrier`.
    pub fn base_interval(&self, carrier: Carrier) -> Duration {
        let secs = self
            .carrier_intervals_secs
            .get(carrier.as_str())
            .copied()
            .unwrap_or(self.default_min_interval_secs);
        Duration::from_secs(secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn inter_task_gap(&self) -> Duration {
        Duration::from_millis(self.inter_task_gap_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.default_min_interval_secs, 60);
        assert_eq!(config.max_backoff_secs, 14_400);
        assert_eq!(config.task_timeout_secs, 60);
        assert_eq!(config.inter_task_gap_ms, 1000);
        assert_eq!(config.base_interval(Carrier::Ups), Duration::from_secs(30));
        assert_eq!(config.base_interval(Carrier::Amazon), Duration::from_secs(60));
        assert_eq!(config.base_interval(Carrier::Unknown), Duration::from_secs(30));
    }

    #[test]
    fn test_carrier_without_entry_uses_default() {
        let config = QueueConfig::default();
        assert_eq!(config.base_interval(Carrier::Ontrac), Duration::from_secs(60));
        assert_eq!(config.base_interval(Carrier::Lasership), Duration::from_secs(60));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: QueueConfig = toml::from_str("task_timeout_secs = 20").unwrap();
        assert_eq!(config.task_timeout(), Duration::from_secs(20));
        assert_eq!(config.base_interval(Carrier::Fedex), Duration::from_secs(30));
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            default_min_interval_secs = 90
            max_backoff_secs = 3600
            task_timeout_secs = 30
            inter_task_gap_ms = 250

            [carrier_intervals_secs]
            ups = 10
        "#;
        let config: QueueConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.base_interval(Carrier::Ups), Duration::from_secs(10));
        assert_eq!(config.base_interval(Carrier::Fedex), Duration::from_secs(90));
        assert_eq!(config.max_backoff(), Duration::from_secs(3600));
        assert_eq!(config.inter_task_gap(), Duration::from_millis(250));
    }
}
