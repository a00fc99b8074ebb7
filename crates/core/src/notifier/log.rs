//! Notifier that only writes to the log.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{CheckSummary, NotifyChannel, NotifyError, Notifier};
use crate::shipment::Shipment;
use crate::tracker::CheckOutcome;

/// Logs every notification through `tracing`. Never fails.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_delivery_alert(
        &self,
        channel: NotifyChannel,
        shipment: &Shipment,
        status: &str,
    ) -> Result<(), NotifyError> {
        info!(
            shipment_id = shipment.id,
            channel = %channel,
            tracking_number = shipment.tracking_number.as_deref().unwrap_or("N/A"),
            "Package delivered: {} ({})",
            shipment.display_name(),
            status
        );
        Ok(())
    }

    async fn send_check_summary(&self, outcomes: &[CheckOutcome]) -> Result<(), NotifyError> {
        let summary = CheckSummary::from_outcomes(outcomes);
        info!(
            total = summary.total,
            changed = summary.changed,
            delivered = summary.delivered,
            errors = summary.errors,
            "Scheduled check complete"
        );
        Ok(())
    }

    async fn send_degraded_status_alert(
        &self,
        shipment: &Shipment,
        previous_status: &str,
    ) -> Result<(), NotifyError> {
        warn!(
            shipment_id = shipment.id,
            "Could not fetch status for {}, keeping \"{}\"",
            shipment.display_name(),
            previous_status
        );
        Ok(())
    }

    async fn send_test_message(&self, channel: NotifyChannel) -> Result<(), NotifyError> {
        info!(channel = %channel, "Test notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier::new();
        assert!(notifier.send_check_summary(&[]).await.is_ok());
        assert!(notifier
            .send_test_message(NotifyChannel::Email)
            .await
            .is_ok());
    }
}
