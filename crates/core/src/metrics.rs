//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Check queue (task outcomes, backoff waits, task duration)
//! - Shipment checks (outcomes, status changes, deliveries, history)
//! - Scheduler and notifications

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Queue Metrics
// =============================================================================

/// Queue tasks settled, by carrier and result.
pub static QUEUE_TASKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shiptrack_queue_tasks_total", "Total queue tasks settled"),
        &["carrier", "result"], // "success", "failure", "timeout"
    )
    .expect("valid metric definition")
});

/// Time spent waiting for a carrier's backoff window.
pub static QUEUE_WAIT_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shiptrack_queue_wait_seconds",
            "Time a task waited for its carrier's rate limit",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 900.0, 3600.0, 14400.0]),
        &["carrier"],
    )
    .expect("valid metric definition")
});

/// Duration of one provider call, including abandoned ones.
pub static CHECK_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shiptrack_check_duration_seconds",
            "Duration of a tracking provider call",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),
        &["carrier"],
    )
    .expect("valid metric definition")
});

/// Tasks enqueued and not yet settled.
pub static QUEUE_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("shiptrack_queue_pending", "Tasks waiting in the check queue")
        .expect("valid metric definition")
});

// =============================================================================
// Check Metrics
// =============================================================================

/// Shipment checks by carrier and outcome.
pub static CHECKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shiptrack_checks_total", "Total shipment checks"),
        &["carrier", "outcome"], // "checked", "skipped", "failed"
    )
    .expect("valid metric definition")
});

/// Checks that changed a shipment's status.
pub static STATUS_CHANGES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shiptrack_status_changes_total",
        "Total shipment status changes",
    )
    .expect("valid metric definition")
});

/// Shipments that transitioned to delivered.
pub static DELIVERIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("shiptrack_deliveries_total", "Total shipments delivered")
        .expect("valid metric definition")
});

/// Checks where an `Unknown` result was suppressed in favour of the previous status.
pub static DEGRADED_CHECKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shiptrack_degraded_checks_total",
        "Checks that kept the previous status instead of Unknown",
    )
    .expect("valid metric definition")
});

/// History rows appended.
pub static HISTORY_EVENTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shiptrack_history_events_total",
        "Total status history rows appended",
    )
    .expect("valid metric definition")
});

// =============================================================================
// Scheduler & Notification Metrics
// =============================================================================

/// Batch runs by trigger.
pub static BATCH_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shiptrack_batch_runs_total", "Total batch check runs"),
        &["trigger"], // "initial", "timer", "manual"
    )
    .expect("valid metric definition")
});

/// 1 while the scheduler's timers are armed.
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("shiptrack_scheduler_running", "Whether the scheduler is running")
        .expect("valid metric definition")
});

/// Notification failures by kind.
pub static NOTIFICATION_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shiptrack_notification_failures_total",
            "Total notifications that could not be delivered",
        ),
        &["kind"], // "delivery", "summary", "degraded"
    )
    .expect("valid metric definition")
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Queue
        Box::new(QUEUE_TASKS_TOTAL.clone()),
        Box::new(QUEUE_WAIT_SECONDS.clone()),
        Box::new(CHECK_DURATION_SECONDS.clone()),
        Box::new(QUEUE_PENDING.clone()),
        // Checks
        Box::new(CHECKS_TOTAL.clone()),
        Box::new(STATUS_CHANGES_TOTAL.clone()),
        Box::new(DELIVERIES_TOTAL.clone()),
        Box::new(DEGRADED_CHECKS_TOTAL.clone()),
        Box::new(HISTORY_EVENTS_TOTAL.clone()),
        // Scheduler & notifications
        Box::new(BATCH_RUNS_TOTAL.clone()),
        Box::new(SCHEDULER_RUNNING.clone()),
        Box::new(NOTIFICATION_FAILURES_TOTAL.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register_without_conflicts() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        QUEUE_TASKS_TOTAL
            .with_label_values(&["ups", "success"])
            .inc();
        let names: Vec<_> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"shiptrack_queue_tasks_total".to_string()));
    }
}
