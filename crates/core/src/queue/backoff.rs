//! Per-carrier spacing and exponential backoff bookkeeping.

use std::collections::HashMap;
use tokio::time::{Duration, Instant};

use crate::carrier::Carrier;

use super::{CarrierStatus, QueueConfig};

#[derive(Debug, Clone, Copy, Default)]
struct CarrierState {
    last_check: Option<Instant>,
    consecutive_failures: u32,
}

/// Pacing state for every carrier the queue has seen.
///
/// Owned by the queue worker; nothing outside the worker mutates it. State is
/// in-memory only, so failure counts restart at zero with the process.
#[derive(Debug, Clone)]
pub struct CarrierBackoff {
    config: QueueConfig,
    carriers: HashMap<Carrier, CarrierState>,
}

impl CarrierBackoff {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            carriers: HashMap::new(),
        }
    }

    fn state(&self, carrier: Carrier) -> CarrierState {
        self.carriers.get(&carrier).copied().unwrap_or_default()
    }

    /// Consecutive failures recorded for `carrier`.
    pub fn failures(&self, carrier: Carrier) -> u32 {
        self.state(carrier).consecutive_failures
    }

    /// `min(2^failures, max_backoff / base_interval)`, and exactly 1 with no failures.
    pub fn backoff_multiplier(&self, carrier: Carrier) -> f64 {
        let failures = self.failures(carrier);
        if failures == 0 {
            return 1.0;
        }

        let base = self.config.base_interval(carrier).as_secs_f64();
        let cap = self.config.max_backoff().as_secs_f64() / base;
        // 2^63 already exceeds any sane cap
        let multiplier = 2f64.powi(failures.min(63) as i32);
        multiplier.min(cap)
    }

    /// Base interval scaled by the current backoff multiplier.
    pub fn effective_interval(&self, carrier: Carrier) -> Duration {
        self.config
            .base_interval(carrier)
            .mul_f64(self.backoff_multiplier(carrier))
    }

    /// Whether a check for `carrier` may start at `now`.
    pub fn can_check(&self, carrier: Carrier, now: Instant) -> bool {
        self.wait_time(carrier, now).is_zero()
    }

    /// Remaining wait before a check for `carrier` may start.
    pub fn wait_time(&self, carrier: Carrier, now: Instant) -> Duration {
        match self.state(carrier).last_check {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                self.effective_interval(carrier).saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        }
    }

    /// Mark the start of a check.
    pub fn record_check(&mut self, carrier: Carrier, now: Instant) {
        self.carriers.entry(carrier).or_default().last_check = Some(now);
    }

    pub fn record_success(&mut self, carrier: Carrier) {
        self.carriers.entry(carrier).or_default().consecutive_failures = 0;
    }

    pub fn record_failure(&mut self, carrier: Carrier) {
        let state = self.carriers.entry(carrier).or_default();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
    }

    /// Snapshot for every carrier seen so far, sorted by carrier id.
    pub fn status(&self, now: Instant) -> Vec<CarrierStatus> {
        let mut statuses: Vec<_> = self
            .carriers
            .iter()
            .map(|(carrier, state)| CarrierStatus {
                carrier: *carrier,
                failures: state.consecutive_failures,
                backoff_multiplier: self.backoff_multiplier(*carrier),
                can_check: self.can_check(*carrier, now),
                wait_ms: self.wait_time(*carrier, now).as_millis() as u64,
                last_check_ago_ms: state
                    .last_check
                    .map(|last| now.saturating_duration_since(last).as_millis() as u64),
            })
            .collect();
        statuses.sort_by_key(|s| s.carrier.as_str());
        statuses
    }
}
