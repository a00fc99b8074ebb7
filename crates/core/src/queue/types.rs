//! Types for the check queue.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::carrier::Carrier;
use crate::provider::ProviderError;

/// Ways a queued task can fail to produce a value.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// The task itself returned an error.
    #[error(transparent)]
    Task(#[from] ProviderError),

    /// The task did not settle before its deadline.
    #[error("{carrier} check timed out after {}s", timeout.as_secs())]
    TimedOut { carrier: Carrier, timeout: Duration },

    /// The task panicked or was cancelled.
    #[error("{carrier} check aborted: {reason}")]
    Aborted { carrier: Carrier, reason: String },

    /// The queue worker is gone.
    #[error("check queue is closed")]
    Closed,
}

/// Pacing snapshot for one carrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierStatus {
    pub carrier: Carrier,
    pub failures: u32,
    pub backoff_multiplier: f64,
    pub can_check: bool,
    /// Milliseconds until a check may start (0 when `can_check`).
    pub wait_ms: u64,
    pub last_check_ago_ms: Option<u64>,
}

/// Queue counters and per-carrier pacing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Tasks submitted but not yet settled.
    pub pending: u64,
    pub total_processed: u64,
    pub total_failed: u64,
    pub total_timed_out: u64,
    pub carriers: Vec<CarrierStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueueError::TimedOut {
            carrier: Carrier::Ups,
            timeout: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "ups check timed out after 60s");

        let err = QueueError::from(ProviderError::Network("reset".to_string()));
        assert_eq!(err.to_string(), "network error: reset");
    }

    #[test]
    fn test_queue_status_default() {
        let status = QueueStatus::default();
        assert_eq!(status.pending, 0);
        assert!(status.carriers.is_empty());
    }
}
