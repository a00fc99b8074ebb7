//! Periodic check scheduler.
//!
//! Runs [`ShipmentTracker::check_all_active_shipments`] on a repeating timer
//! and once shortly after start, then reports a summary through the notifier.
//!
//! [`ShipmentTracker::check_all_active_shipments`]: crate::tracker::ShipmentTracker::check_all_active_shipments

mod config;
mod runner;
mod timer;
mod types;

pub use config::SchedulerConfig;
pub use runner::Scheduler;
pub use timer::{OneShotTimer, RepeatingTimer};
pub use types::SchedulerStatus;
