//! Shipments, their status history, and persisted settings.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteShipmentStore;
pub use store::{ShipmentStore, StoreError};
pub use types::{
    history_key, NewHistoryEvent, NewShipment, Shipment, ShipmentUpdate, StatusHistoryEvent,
};

/// Setting key holding the scheduler poll interval in minutes.
pub const POLL_INTERVAL_SETTING: &str = "poll_interval_minutes";
/// Setting key holding the Discord webhook URL.
pub const DISCORD_WEBHOOK_SETTING: &str = "discord_webhook_url";
/// Setting key holding `"true"` when Discord notifications are enabled.
pub const DISCORD_ENABLED_SETTING: &str = "discord_enabled";
/// Setting key holding `"true"` when email notifications are enabled.
pub const EMAIL_ENABLED_SETTING: &str = "email_enabled";
/// Setting key holding the recipient of email notifications.
pub const NOTIFICATION_EMAIL_SETTING: &str = "notification_email";
pub const SMTP_HOST_SETTING: &str = "smtp_host";
pub const SMTP_PORT_SETTING: &str = "smtp_port";
pub const SMTP_USER_SETTING: &str = "smtp_user";
pub const SMTP_PASS_SETTING: &str = "smtp_pass";
