//! Routes each notification to the transport for its channel.

use std::sync::Arc;

use async_trait::async_trait;

use super::{NotifyChannel, NotifyError, Notifier};
use crate::shipment::Shipment;
use crate::tracker::CheckOutcome;

/// Composes one notifier per channel.
///
/// Delivery alerts and test messages go to the notifier of their channel.
/// Batch summaries and degraded alerts only go to Discord.
pub struct ChannelNotifier {
    email: Arc<dyn Notifier>,
    discord: Arc<dyn Notifier>,
}

impl ChannelNotifier {
    pub fn new(email: Arc<dyn Notifier>, discord: Arc<dyn Notifier>) -> Self {
        Self { email, discord }
    }

    fn route(&self, channel: NotifyChannel) -> &dyn Notifier {
        match channel {
            NotifyChannel::Email => self.email.as_ref(),
            NotifyChannel::Discord => self.discord.as_ref(),
        }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send_delivery_alert(
        &self,
        channel: NotifyChannel,
        shipment: &Shipment,
        status: &str,
    ) -> Result<(), NotifyError> {
        self.route(channel)
            .send_delivery_alert(channel, shipment, status)
            .await
    }

    async fn send_check_summary(&self, outcomes: &[CheckOutcome]) -> Result<(), NotifyError> {
        self.discord.send_check_summary(outcomes).await
    }

    async fn send_degraded_status_alert(
        &self,
        shipment: &Shipment,
        previous_status: &str,
    ) -> Result<(), NotifyError> {
        self.discord
            .send_degraded_status_alert(shipment, previous_status)
            .await
    }

    async fn send_test_message(&self, channel: NotifyChannel) -> Result<(), NotifyError> {
        self.route(channel).send_test_message(channel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockNotifier, Notification};

    fn router() -> (ChannelNotifier, Arc<MockNotifier>, Arc<MockNotifier>) {
        let email = Arc::new(MockNotifier::new());
        let discord = Arc::new(MockNotifier::new());
        (
            ChannelNotifier::new(email.clone(), discord.clone()),
            email,
            discord,
        )
    }

    #[tokio::test]
    async fn test_delivery_routes_by_channel() {
        let (notifier, email, discord) = router();
        let s = fixtures::ups_shipment(1);

        notifier
            .send_delivery_alert(NotifyChannel::Email, &s, "Delivered")
            .await
            .unwrap();
        assert_eq!(email.deliveries().await.len(), 1);
        assert!(discord.deliveries().await.is_empty());

        notifier
            .send_delivery_alert(NotifyChannel::Discord, &s, "Delivered")
            .await
            .unwrap();
        assert_eq!(email.deliveries().await.len(), 1);
        assert_eq!(discord.deliveries().await[0].0, NotifyChannel::Discord);
    }

    #[tokio::test]
    async fn test_summary_and_degraded_go_to_discord() {
        let (notifier, email, discord) = router();
        let s = fixtures::ups_shipment(1);

        notifier.send_check_summary(&[]).await.unwrap();
        notifier
            .send_degraded_status_alert(&s, "In Transit")
            .await
            .unwrap();

        assert!(email.sent().await.is_empty());
        assert_eq!(discord.summaries().await.len(), 1);
        assert_eq!(discord.degraded().await, vec![(1, "In Transit".to_string())]);
    }

    #[tokio::test]
    async fn test_test_message_routes_by_channel() {
        let (notifier, email, discord) = router();
        notifier.send_test_message(NotifyChannel::Email).await.unwrap();

        assert_eq!(
            email.sent().await,
            vec![Notification::Test {
                channel: NotifyChannel::Email
            }]
        );
        assert!(discord.sent().await.is_empty());
    }
}
