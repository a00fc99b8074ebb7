//! Outbound notifications.
//!
//! The core only ever calls a [`Notifier`] in fire-and-forget fashion: errors
//! are logged by the caller and never change the outcome of a check.

mod discord;
mod email;
mod log;
mod router;
mod summary;

pub use discord::DiscordNotifier;
pub use email::{EmailNotifier, SmtpSettings};
pub use log::LogNotifier;
pub use router::ChannelNotifier;
pub use summary::{shipment_line, CheckSummary, SUMMARY_FIELD_LIMIT};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shipment::Shipment;
use crate::tracker::CheckOutcome;

/// Delivery channel a shipment can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyChannel {
    Email,
    Discord,
}

impl NotifyChannel {
    /// Channels enabled on a shipment, in a fixed order.
    pub fn enabled_for(shipment: &Shipment) -> Vec<NotifyChannel> {
        let mut channels = Vec::new();
        if shipment.notify_email {
            channels.push(NotifyChannel::Email);
        }
        if shipment.notify_discord {
            channels.push(NotifyChannel::Discord);
        }
        channels
    }
}

impl std::str::FromStr for NotifyChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "email" => Ok(NotifyChannel::Email),
            "discord" => Ok(NotifyChannel::Discord),
            other => Err(format!("unknown notification channel: {}", other)),
        }
    }
}

impl fmt::Display for NotifyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyChannel::Email => write!(f, "email"),
            NotifyChannel::Discord => write!(f, "discord"),
        }
    }
}

/// Notification errors.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The channel is disabled or missing required settings.
    #[error("notification not configured: {0}")]
    Configuration(String),

    /// Delivery to the remote endpoint failed.
    #[error("notification delivery failed: {0}")]
    Http(String),

    /// This notifier cannot deliver on the requested channel.
    #[error("{0} notifications are not supported by this notifier")]
    Unsupported(NotifyChannel),
}

/// Sink for shipment notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A shipment was just delivered.
    async fn send_delivery_alert(
        &self,
        channel: NotifyChannel,
        shipment: &Shipment,
        status: &str,
    ) -> Result<(), NotifyError>;

    /// Aggregate report of a scheduled batch.
    async fn send_check_summary(&self, outcomes: &[CheckOutcome]) -> Result<(), NotifyError>;

    /// A check returned nothing usable and the previous status was kept.
    async fn send_degraded_status_alert(
        &self,
        shipment: &Shipment,
        previous_status: &str,
    ) -> Result<(), NotifyError>;

    /// Verify a channel's configuration by sending a test message.
    async fn send_test_message(&self, channel: NotifyChannel) -> Result<(), NotifyError>;
}
