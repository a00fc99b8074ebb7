//! Scheduler status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_minutes: u64,
    /// When the last batch started.
    pub last_check_time: Option<DateTime<Utc>>,
    /// `last_check_time + interval`; unset until a batch has run.
    pub next_check_time: Option<DateTime<Utc>>,
    /// Whole seconds until `next_check_time`, never negative.
    pub seconds_until_next_check: Option<u64>,
}
