//! Check outcome types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::carrier::Carrier;
use crate::queue::QueueError;
use crate::shipment::StoreError;

/// Errors from a single shipment check.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    #[error("Shipment {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// What one successful check found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResultSummary {
    pub shipment_id: i64,
    pub carrier: Carrier,
    pub tracking_number: Option<String>,
    /// Status in effect after the check.
    pub status: String,
    pub is_delivered: bool,
    pub status_changed: bool,
    /// Number of discrete events the provider returned.
    pub events_found: usize,
    pub checked_at: DateTime<Utc>,
}

/// Why a check did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyDelivered,
    /// Another check of the same shipment was already running.
    CheckInProgress,
}

/// Result of one attempted check. Batches yield exactly one per shipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    Checked(CheckResultSummary),
    Skipped { shipment_id: i64, reason: SkipReason },
    Failed { shipment_id: i64, error: String },
}

impl CheckOutcome {
    pub fn shipment_id(&self) -> i64 {
        match self {
            CheckOutcome::Checked(summary) => summary.shipment_id,
            CheckOutcome::Skipped { shipment_id, .. } | CheckOutcome::Failed { shipment_id, .. } => {
                *shipment_id
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, CheckOutcome::Checked(s) if s.is_delivered)
    }

    pub fn status_changed(&self) -> bool {
        matches!(self, CheckOutcome::Checked(s) if s.status_changed)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CheckOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CheckOutcome::Skipped { .. })
    }
}
