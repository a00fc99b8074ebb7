//! Check orchestration.
//!
//! [`ShipmentTracker`] checks one shipment at a time: it resolves the carrier,
//! runs the provider call through the shared [`RateLimitedQueue`], reconciles
//! the result with the stored record and history, and fires notifications.
//!
//! [`RateLimitedQueue`]: crate::queue::RateLimitedQueue

mod checker;
mod types;

pub use checker::ShipmentTracker;
pub use types::{CheckOutcome, CheckResultSummary, SkipReason, TrackerError};
