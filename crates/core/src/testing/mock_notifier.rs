//! Mock notifier for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::notifier::{NotifyChannel, NotifyError, Notifier};
use crate::shipment::Shipment;
use crate::tracker::CheckOutcome;

/// A notification captured by [`MockNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Delivery {
        channel: NotifyChannel,
        shipment: Shipment,
        status: String,
    },
    Summary {
        outcomes: Vec<CheckOutcome>,
    },
    Degraded {
        shipment_id: i64,
        previous_status: String,
    },
    Test {
        channel: NotifyChannel,
    },
}

/// Mock implementation of the Notifier trait.
///
/// Records every call. When failing is enabled, calls are still recorded
/// and then return an HTTP error.
pub struct MockNotifier {
    sent: Arc<RwLock<Vec<Notification>>>,
    fail: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for MockNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockNotifier")
            .field("sent", &"<sent>")
            .field("fail", &"<fail>")
            .finish()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
            fail: Arc::new(RwLock::new(false)),
        }
    }

    /// Make subsequent calls fail after recording them.
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Everything sent so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }

    pub async fn deliveries(&self) -> Vec<(NotifyChannel, Shipment, String)> {
        self.sent
            .read()
            .await
            .iter()
            .filter_map(|n| match n {
                Notification::Delivery {
                    channel,
                    shipment,
                    status,
                } => Some((*channel, shipment.clone(), status.clone())),
                _ => None,
            })
            .collect()
    }

    pub async fn summaries(&self) -> Vec<Vec<CheckOutcome>> {
        self.sent
            .read()
            .await
            .iter()
            .filter_map(|n| match n {
                Notification::Summary { outcomes } => Some(outcomes.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn degraded(&self) -> Vec<(i64, String)> {
        self.sent
            .read()
            .await
            .iter()
            .filter_map(|n| match n {
                Notification::Degraded {
                    shipment_id,
                    previous_status,
                } => Some((*shipment_id, previous_status.clone())),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.write().await.push(notification);
        if *self.fail.read().await {
            return Err(NotifyError::Http("mock notifier failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_delivery_alert(
        &self,
        channel: NotifyChannel,
        shipment: &Shipment,
        status: &str,
    ) -> Result<(), NotifyError> {
        self.record(Notification::Delivery {
            channel,
            shipment: shipment.clone(),
            status: status.to_string(),
        })
        .await
    }

    async fn send_check_summary(&self, outcomes: &[CheckOutcome]) -> Result<(), NotifyError> {
        self.record(Notification::Summary {
            outcomes: outcomes.to_vec(),
        })
        .await
    }

    async fn send_degraded_status_alert(
        &self,
        shipment: &Shipment,
        previous_status: &str,
    ) -> Result<(), NotifyError> {
        self.record(Notification::Degraded {
            shipment_id: shipment.id,
            previous_status: previous_status.to_string(),
        })
        .await
    }

    async fn send_test_message(&self, channel: NotifyChannel) -> Result<(), NotifyError> {
        self.record(Notification::Test { channel }).await
    }
}
