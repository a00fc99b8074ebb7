//! Scheduler implementation.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::metrics;
use crate::notifier::CheckSummary;
use crate::shipment::{StoreError, POLL_INTERVAL_SETTING};
use crate::tracker::{CheckOutcome, ShipmentTracker, TrackerError};

use super::timer::{OneShotTimer, RepeatingTimer};
use super::{SchedulerConfig, SchedulerStatus};

/// Timers owned by a running scheduler.
struct ActiveTimers {
    poll: RepeatingTimer,
    initial: OneShotTimer,
    interval_minutes: u64,
}

/// Periodically checks every active shipment.
///
/// Stopped until [`start`](Self::start) is called. Starting arms a repeating
/// poll timer and a one-shot timer for an initial check shortly after start.
pub struct Scheduler {
    config: SchedulerConfig,
    tracker: Arc<ShipmentTracker>,
    timers: Mutex<Option<ActiveTimers>>,
    last_check: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, tracker: Arc<ShipmentTracker>) -> Self {
        Self {
            config,
            tracker,
            timers: Mutex::new(None),
            last_check: Arc::new(RwLock::new(None)),
        }
    }

    /// Poll interval in minutes: the saved setting, else the configured
    /// default, clamped into the configured floor and ceiling.
    ///
    /// A saved value that parses as a number is clamped even when negative;
    /// only unparsable text falls back to the default.
    pub fn interval_minutes(&self) -> u64 {
        let saved = match self.tracker.store().get_setting(POLL_INTERVAL_SETTING) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read poll interval setting: {}", e);
                None
            }
        };
        let saved = saved.as_deref().map(str::trim).and_then(|value| {
            value
                .parse::<i64>()
                .map(|minutes| self.config.clamp_signed_interval(minutes))
                .or_else(|_| value.parse::<u64>().map(|m| self.config.clamp_interval(m)))
                .ok()
        });
        saved.unwrap_or_else(|| {
            self.config
                .clamp_interval(self.config.default_poll_interval_minutes)
        })
    }

    /// Start the scheduler. A no-op if already running.
    pub async fn start(&self) {
        let mut timers = self.timers.lock().await;
        if timers.is_some() {
            info!("Scheduler already running");
            return;
        }

        let interval_minutes = self.interval_minutes();
        info!("Starting scheduler with {} minute interval", interval_minutes);

        let poll = {
            let tracker = Arc::clone(&self.tracker);
            let last_check = Arc::clone(&self.last_check);
            RepeatingTimer::arm(
                Duration::from_secs(interval_minutes.saturating_mul(60)),
                move || {
                    let tracker = Arc::clone(&tracker);
                    let last_check = Arc::clone(&last_check);
                    async move {
                        info!("Running scheduled tracking check");
                        let _ = run_batch(&tracker, &last_check, "timer").await;
                    }
                },
            )
        };

        let initial = {
            let tracker = Arc::clone(&self.tracker);
            let last_check = Arc::clone(&self.last_check);
            OneShotTimer::arm(
                Duration::from_secs(self.config.initial_delay_secs),
                move || async move {
                    info!("Running initial tracking check on startup");
                    let _ = run_batch(&tracker, &last_check, "initial").await;
                },
            )
        };

        metrics::SCHEDULER_RUNNING.set(1);
        *timers = Some(ActiveTimers {
            poll,
            initial,
            interval_minutes,
        });
    }

    /// Stop the scheduler. A batch already in progress finishes.
    pub async fn stop(&self) {
        let mut timers = self.timers.lock().await;
        if let Some(mut active) = timers.take() {
            active.poll.disarm();
            active.initial.disarm();
            metrics::SCHEDULER_RUNNING.set(0);
            info!("Scheduler stopped");
        }
    }

    /// Stop, then start with the current poll interval.
    pub async fn restart(&self) {
        self.stop().await;
        self.start().await;
    }

    pub async fn is_running(&self) -> bool {
        self.timers.lock().await.is_some()
    }

    /// Save a new poll interval (clamped into the floor and ceiling) and
    /// apply it.
    ///
    /// A running scheduler is restarted only when the interval changed.
    /// Returns the interval actually saved.
    pub async fn set_poll_interval(&self, minutes: u64) -> Result<u64, StoreError> {
        let minutes = self.config.clamp_interval(minutes);
        self.tracker
            .store()
            .set_setting(POLL_INTERVAL_SETTING, &minutes.to_string())?;

        let running_interval = self
            .timers
            .lock()
            .await
            .as_ref()
            .map(|active| active.interval_minutes);
        if let Some(current) = running_interval {
            if current != minutes {
                info!(
                    "Poll interval changed from {} to {} minutes, restarting scheduler",
                    current, minutes
                );
                self.restart().await;
            }
        }
        Ok(minutes)
    }

    /// Run one batch now, outside the timers.
    pub async fn run_now(&self) -> Result<Vec<CheckOutcome>, TrackerError> {
        run_batch(&self.tracker, &self.last_check, "manual").await
    }

    pub async fn status(&self) -> SchedulerStatus {
        let running = self.is_running().await;
        let interval_minutes = self.interval_minutes();
        let last_check_time = *self
            .last_check
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let next_check_time = last_check_time.filter(|_| running).and_then(|last| {
            let interval = i64::try_from(interval_minutes)
                .ok()
                .and_then(chrono::Duration::try_minutes)?;
            last.checked_add_signed(interval)
        });
        let seconds_until_next_check =
            next_check_time.map(|next| (next - Utc::now()).num_seconds().max(0) as u64);

        SchedulerStatus {
            running,
            interval_minutes,
            last_check_time,
            next_check_time,
            seconds_until_next_check,
        }
    }
}

/// Run a batch, log its counts and send the summary.
///
/// Failures are logged here; callers that only fire the batch may ignore
/// the returned result.
async fn run_batch(
    tracker: &ShipmentTracker,
    last_check: &RwLock<Option<DateTime<Utc>>>,
    trigger: &'static str,
) -> Result<Vec<CheckOutcome>, TrackerError> {
    *last_check
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Utc::now());
    metrics::BATCH_RUNS_TOTAL.with_label_values(&[trigger]).inc();

    let outcomes = match tracker.check_all_active_shipments().await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!(trigger, "Scheduled check failed: {}", e);
            return Err(e);
        }
    };

    let summary = CheckSummary::from_outcomes(&outcomes);
    info!(
        trigger,
        "Check complete: {} shipments, {} delivered, {} errors",
        summary.total,
        summary.delivered,
        summary.errors
    );

    if let Err(e) = tracker.notifier().send_check_summary(&outcomes).await {
        warn!(trigger, "Failed to send check summary: {}", e);
        metrics::NOTIFICATION_FAILURES_TOTAL
            .with_label_values(&["summary"])
            .inc();
    }
    Ok(outcomes)
}
