//! Rate-limited task queue for outbound tracking checks.
//!
//! All checks go through one worker task:
//! - **Ordering**: strict FIFO, no per-carrier reordering
//! - **Concurrency**: one task in flight at a time
//! - **Pacing**: per-carrier minimum spacing, doubled per consecutive failure
//!   and capped, plus a fixed gap between tasks
//! - **Deadline**: every task carries a hard timeout; a timed out call is
//!   abandoned and the worker moves on

mod backoff;
mod config;
mod runner;
mod types;

pub use backoff::CarrierBackoff;
pub use config::QueueConfig;
pub use runner::RateLimitedQueue;
pub use types::{CarrierStatus, QueueError, QueueStatus};
