//! Shipment check and reconciliation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::carrier::{
    detect_carrier, extract_tracking_number, normalize_status, Carrier, PENDING_FIRST_CHECK,
    UNKNOWN_STATUS,
};
use crate::metrics;
use crate::notifier::{NotifyChannel, Notifier};
use crate::provider::{ProviderRegistry, TrackingResult};
use crate::queue::{QueueConfig, QueueStatus, RateLimitedQueue};
use crate::shipment::{NewHistoryEvent, Shipment, ShipmentStore, ShipmentUpdate};

use super::{CheckOutcome, CheckResultSummary, SkipReason, TrackerError};

/// Status decision for one check.
#[derive(Debug, PartialEq)]
struct StatusDecision {
    /// Status stored after the check.
    effective: String,
    /// Set when an `Unknown` result was suppressed; holds the kept status.
    kept_previous: Option<String>,
    changed: bool,
}

/// Apply the overwrite policy: a known status is never replaced by `Unknown`,
/// unless the previous status was absent or the pending sentinel.
fn decide_status(previous: Option<&str>, normalized: &str) -> StatusDecision {
    let kept_previous = match previous {
        Some(prev)
            if normalized == UNKNOWN_STATUS && !prev.is_empty() && prev != PENDING_FIRST_CHECK =>
        {
            Some(prev.to_string())
        }
        _ => None,
    };
    let effective = kept_previous
        .clone()
        .unwrap_or_else(|| normalized.to_string());
    let changed = kept_previous.is_none() && previous != Some(effective.as_str());

    StatusDecision {
        effective,
        kept_previous,
        changed,
    }
}

/// Marks a shipment as being checked until dropped.
struct InFlight {
    ids: Arc<Mutex<HashSet<i64>>>,
    id: i64,
}

impl InFlight {
    /// `None` if a check of `id` is already running.
    fn acquire(ids: &Arc<Mutex<HashSet<i64>>>, id: i64) -> Option<Self> {
        let inserted = ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        inserted.then(|| Self {
            ids: Arc::clone(ids),
            id,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

fn skipped(shipment: &Shipment, reason: SkipReason) -> CheckOutcome {
    metrics::CHECKS_TOTAL
        .with_label_values(&[
            shipment.carrier.unwrap_or(Carrier::Unknown).as_str(),
            "skipped",
        ])
        .inc();
    CheckOutcome::Skipped {
        shipment_id: shipment.id,
        reason,
    }
}

/// Runs checks against the store, providers, queue and notifier.
///
/// One tracker owns one queue; every check path (scheduled batches and
/// direct requests) should go through the same tracker so they share
/// carrier backoff. At most one check per shipment runs at a time.
pub struct ShipmentTracker {
    store: Arc<dyn ShipmentStore>,
    providers: ProviderRegistry,
    queue: RateLimitedQueue<TrackingResult>,
    notifier: Arc<dyn Notifier>,
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

impl ShipmentTracker {
    /// Create a tracker and start its queue worker. Must be called inside a Tokio runtime.
    pub fn new(
        store: Arc<dyn ShipmentStore>,
        providers: ProviderRegistry,
        queue_config: QueueConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            providers,
            queue: RateLimitedQueue::new(queue_config),
            notifier,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn ShipmentStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }

    /// Check one shipment now (subject to queue pacing).
    ///
    /// Returns `Skipped` without touching the provider or the store when the
    /// shipment is already delivered or another check of it is running. The
    /// record is read again once the provider answers, so a delivery recorded
    /// meanwhile is not reconciled twice. Queue and store failures propagate.
    pub async fn check_shipment(&self, id: i64) -> Result<CheckOutcome, TrackerError> {
        let mut shipment = self
            .store
            .get_by_id(id)?
            .ok_or(TrackerError::NotFound(id))?;

        if shipment.is_delivered {
            debug!(shipment_id = id, "Shipment already delivered, skipping");
            return Ok(skipped(&shipment, SkipReason::AlreadyDelivered));
        }

        let Some(_in_flight) = InFlight::acquire(&self.in_flight, id) else {
            debug!(shipment_id = id, "Shipment check already in progress, skipping");
            return Ok(skipped(&shipment, SkipReason::CheckInProgress));
        };

        let carrier = self.resolve(&mut shipment)?;
        let result = match self.fetch(&shipment, carrier).await {
            Ok(result) => result,
            Err(e) => {
                metrics::CHECKS_TOTAL
                    .with_label_values(&[carrier.as_str(), "failed"])
                    .inc();
                return Err(e);
            }
        };

        let shipment = self
            .store
            .get_by_id(id)?
            .ok_or(TrackerError::NotFound(id))?;
        if shipment.is_delivered {
            debug!(shipment_id = id, "Shipment delivered during check, skipping");
            return Ok(skipped(&shipment, SkipReason::AlreadyDelivered));
        }

        let summary = self.reconcile(shipment, carrier, result).await?;
        metrics::CHECKS_TOTAL
            .with_label_values(&[carrier.as_str(), "checked"])
            .inc();
        Ok(CheckOutcome::Checked(summary))
    }

    /// Check every undelivered shipment in order.
    ///
    /// A failing shipment is recorded as [`CheckOutcome::Failed`] and never
    /// stops the batch. Only failing to list the shipments is an error.
    pub async fn check_all_active_shipments(&self) -> Result<Vec<CheckOutcome>, TrackerError> {
        let active = self.store.get_active()?;
        info!("Checking {} active shipments", active.len());

        let mut outcomes = Vec::with_capacity(active.len());
        for shipment in active {
            match self.check_shipment(shipment.id).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(shipment_id = shipment.id, "Error checking shipment: {}", e);
                    outcomes.push(CheckOutcome::Failed {
                        shipment_id: shipment.id,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(outcomes)
    }

    /// Fill in carrier and tracking number from the URL when unset, and
    /// persist whatever was newly resolved.
    fn resolve(&self, shipment: &mut Shipment) -> Result<Carrier, TrackerError> {
        let carrier = shipment
            .carrier
            .unwrap_or_else(|| detect_carrier(&shipment.tracking_url));
        let tracking_number = shipment
            .tracking_number
            .clone()
            .or_else(|| extract_tracking_number(&shipment.tracking_url, carrier));

        let mut update = ShipmentUpdate::new();
        if shipment.carrier != Some(carrier) {
            update = update.with_carrier(carrier);
        }
        if shipment.tracking_number != tracking_number {
            if let Some(number) = &tracking_number {
                update = update.with_tracking_number(number.clone());
            }
        }

        if !update.is_empty() {
            debug!(
                shipment_id = shipment.id,
                carrier = %carrier,
                tracking_number = tracking_number.as_deref().unwrap_or("-"),
                "Resolved carrier"
            );
            self.store.update(shipment.id, &update)?;
            update.apply(shipment);
        }
        Ok(carrier)
    }

    async fn fetch(
        &self,
        shipment: &Shipment,
        carrier: Carrier,
    ) -> Result<TrackingResult, TrackerError> {
        let provider = self.providers.get(carrier);
        let shipment_id = shipment.id;
        let url = shipment.tracking_url.clone();
        let tracking_number = shipment.tracking_number.clone();

        let result = self
            .queue
            .enqueue(carrier, move || async move {
                info!(
                    shipment_id,
                    provider = provider.name(),
                    "Checking shipment {} ({})",
                    shipment_id,
                    carrier
                );
                provider.track(&url, tracking_number.as_deref()).await
            })
            .await?;
        Ok(result)
    }

    async fn reconcile(
        &self,
        mut shipment: Shipment,
        carrier: Carrier,
        result: TrackingResult,
    ) -> Result<CheckResultSummary, TrackerError> {
        let id = shipment.id;
        let was_delivered = shipment.is_delivered;
        let normalized = normalize_status(&result.status);
        let previous = shipment.current_status.clone();
        let decision = decide_status(previous.as_deref(), &normalized);
        let now = Utc::now();

        let mut update = ShipmentUpdate::new()
            .with_current_status(decision.effective.clone())
            .with_delivered(result.is_delivered)
            .with_last_checked_at(now);
        if decision.changed {
            update = update.with_last_status_change_at(now);
            metrics::STATUS_CHANGES_TOTAL.inc();
        }
        self.store.update(id, &update)?;
        update.apply(&mut shipment);

        if let Some(kept) = &decision.kept_previous {
            info!(
                shipment_id = id,
                "Keeping previous status \"{}\" instead of \"{}\"", kept, UNKNOWN_STATUS
            );
            metrics::DEGRADED_CHECKS_TOTAL.inc();
            if let Err(e) = self.notifier.send_degraded_status_alert(&shipment, kept).await {
                warn!(shipment_id = id, "Failed to send degraded status alert: {}", e);
                metrics::NOTIFICATION_FAILURES_TOTAL
                    .with_label_values(&["degraded"])
                    .inc();
            }
        }

        if decision.changed || !result.events.is_empty() {
            self.record_history(id, previous.as_deref(), &normalized, &decision, &result, now)?;
        }

        if result.is_delivered && !was_delivered {
            info!(shipment_id = id, "Shipment {} has been delivered!", id);
            metrics::DELIVERIES_TOTAL.inc();
            self.notify_delivery(&shipment, &normalized).await;
        }

        Ok(CheckResultSummary {
            shipment_id: id,
            carrier,
            tracking_number: shipment.tracking_number.clone(),
            status: decision.effective,
            is_delivered: result.is_delivered,
            status_changed: decision.changed,
            events_found: result.events.len(),
            checked_at: now,
        })
    }

    /// Append provider events not already stored. With no events, a status
    /// change still gets one synthesized row.
    fn record_history(
        &self,
        id: i64,
        previous: Option<&str>,
        normalized: &str,
        decision: &StatusDecision,
        result: &TrackingResult,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let mut seen: HashSet<(String, String)> = self
            .store
            .get_history(id)?
            .iter()
            .map(|event| event.key())
            .collect();

        let mut inserted = 0u64;
        for event in &result.events {
            let row = NewHistoryEvent::new(id, event.status.clone())
                .with_location(event.location.clone())
                .with_details(event.details.clone())
                .with_timestamp(event.timestamp.clone())
                .with_raw_data(result.raw_data.clone());
            if seen.insert(row.key()) {
                self.store.add_history(row)?;
                inserted += 1;
            }
        }

        if result.events.is_empty() && decision.changed {
            let details = format!(
                "Status changed from \"{}\" to \"{}\"",
                previous.unwrap_or("none"),
                normalized
            );
            self.store.add_history(
                NewHistoryEvent::new(id, normalized)
                    .with_details(Some(details))
                    .with_timestamp(Some(now.to_rfc3339())),
            )?;
            inserted += 1;
        }

        if inserted > 0 {
            debug!(shipment_id = id, inserted, "Recorded status history");
            metrics::HISTORY_EVENTS_TOTAL.inc_by(inserted);
        }
        Ok(())
    }

    async fn notify_delivery(&self, shipment: &Shipment, status: &str) {
        for channel in NotifyChannel::enabled_for(shipment) {
            match self
                .notifier
                .send_delivery_alert(channel, shipment, status)
                .await
            {
                Ok(()) => info!(
                    shipment_id = shipment.id,
                    channel = %channel,
                    "Delivery notification sent"
                ),
                Err(e) => {
                    error!(
                        shipment_id = shipment.id,
                        channel = %channel,
                        "Failed to send delivery notification: {}",
                        e
                    );
                    metrics::NOTIFICATION_FAILURES_TOTAL
                        .with_label_values(&["delivery"])
                        .inc();
                }
            }
        }
    }
}
