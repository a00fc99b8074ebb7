//! Discord webhook notifier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::{CheckSummary, NotifyChannel, NotifyError, Notifier};
use crate::config::NotificationsConfig;
use crate::shipment::{
    Shipment, ShipmentStore, DISCORD_ENABLED_SETTING, DISCORD_WEBHOOK_SETTING,
};
use crate::tracker::CheckOutcome;

const FOOTER: &str = "Shipping Monitor";

const COLOR_DELIVERED: u32 = 0x22c55e;
const COLOR_WARNING: u32 = 0xf59e0b;
const COLOR_ERROR: u32 = 0xef4444;
const COLOR_INFO: u32 = 0x3b82f6;

#[derive(Debug, Serialize)]
struct WebhookPayload {
    content: Option<String>,
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
    timestamp: String,
    footer: EmbedFooter,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

impl Embed {
    fn new(title: &str, color: u32) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            url: None,
            color,
            fields: Vec::new(),
            timestamp: Utc::now().to_rfc3339(),
            footer: EmbedFooter {
                text: FOOTER.to_string(),
            },
        }
    }
}

fn carrier_label(shipment: &Shipment) -> String {
    shipment
        .carrier
        .map(|c| c.as_str().to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn delivery_embed(shipment: &Shipment, status: &str) -> Embed {
    let mut embed = Embed::new("Package Delivered!", COLOR_DELIVERED);
    embed.url = Some(shipment.tracking_url.clone()).filter(|u| !u.is_empty());
    embed.fields = vec![
        EmbedField::new(
            "Package",
            shipment
                .friendly_name
                .clone()
                .unwrap_or_else(|| "Unknown Package".to_string()),
            true,
        ),
        EmbedField::new("Carrier", carrier_label(shipment), true),
        EmbedField::new("Status", status, true),
        EmbedField::new(
            "Tracking Number",
            shipment.tracking_number.as_deref().unwrap_or("N/A"),
            false,
        ),
    ];
    embed
}

fn degraded_embed(shipment: &Shipment, previous_status: &str) -> Embed {
    let mut embed = Embed::new("⚠️ Status Check Failed", COLOR_WARNING);
    embed.description = Some(format!(
        "Could not fetch status for **{}**. Keeping previous status.",
        shipment.display_name()
    ));
    embed.fields = vec![
        EmbedField::new("Previous Status", previous_status, true),
        EmbedField::new("Carrier", carrier_label(shipment), true),
        EmbedField::new(
            "Tracking",
            shipment.tracking_number.as_deref().unwrap_or("N/A"),
            true,
        ),
    ];
    embed
}

fn summary_embed(outcomes: &[CheckOutcome]) -> Embed {
    let summary = CheckSummary::from_outcomes(outcomes);
    let color = if summary.errors > 0 {
        COLOR_ERROR
    } else if summary.changed > 0 {
        COLOR_WARNING
    } else {
        COLOR_INFO
    };

    let mut embed = Embed::new("📋 Scheduled Check Complete", color);
    embed.footer.text = format!("{} - Auto Check", FOOTER);
    embed
        .fields
        .push(EmbedField::new("Summary", summary.headline(), false));
    if summary.total > 0 {
        embed.fields.push(EmbedField::new(
            "Shipments",
            CheckSummary::shipment_lines(outcomes),
            false,
        ));
    }
    embed
}

fn test_embed() -> Embed {
    let mut embed = Embed::new("Shipping Monitor - Test Message", COLOR_INFO);
    embed.description = Some("Your Discord notifications are configured correctly!".to_string());
    embed
}

/// Posts embeds to a Discord webhook.
///
/// Whether Discord is enabled, and the webhook URL, are read from persisted
/// settings on every send so changes apply without a restart. The configured
/// URL is used when no URL has been saved.
pub struct DiscordNotifier {
    client: Client,
    store: Arc<dyn ShipmentStore>,
    fallback_webhook_url: Option<String>,
}

impl DiscordNotifier {
    pub fn new(
        store: Arc<dyn ShipmentStore>,
        config: &NotificationsConfig,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| NotifyError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            store,
            fallback_webhook_url: config.discord_webhook_url.clone(),
        })
    }

    /// Discord is enabled only when the setting is exactly `"true"`.
    pub fn is_enabled(&self) -> Result<bool, NotifyError> {
        let value = self
            .store
            .get_setting(DISCORD_ENABLED_SETTING)
            .map_err(|e| NotifyError::Configuration(format!("cannot read settings: {}", e)))?;
        Ok(value.as_deref() == Some("true"))
    }

    /// Saved webhook URL, falling back to the configured one.
    pub fn webhook_url(&self) -> Result<Option<String>, NotifyError> {
        let saved = self
            .store
            .get_setting(DISCORD_WEBHOOK_SETTING)
            .map_err(|e| NotifyError::Configuration(format!("cannot read settings: {}", e)))?;
        Ok(saved
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.fallback_webhook_url.clone())
            .filter(|url| !url.trim().is_empty()))
    }

    /// Webhook URL when enabled and configured; `None` means skip quietly.
    fn active_webhook(&self) -> Result<Option<String>, NotifyError> {
        if !self.is_enabled()? {
            return Ok(None);
        }
        self.webhook_url()
    }

    async fn post(&self, url: &str, payload: &WebhookPayload) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Http(format!(
                "webhook returned {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_delivery_alert(
        &self,
        channel: NotifyChannel,
        shipment: &Shipment,
        status: &str,
    ) -> Result<(), NotifyError> {
        if channel != NotifyChannel::Discord {
            return Err(NotifyError::Unsupported(channel));
        }
        if !self.is_enabled()? {
            debug!(shipment_id = shipment.id, "Discord notifications disabled");
            return Ok(());
        }
        let url = self.webhook_url()?.ok_or_else(|| {
            NotifyError::Configuration("Discord webhook URL not configured".to_string())
        })?;

        self.post(
            &url,
            &WebhookPayload {
                content: None,
                embeds: vec![delivery_embed(shipment, status)],
            },
        )
        .await?;
        info!(shipment_id = shipment.id, "Discord delivery notification sent");
        Ok(())
    }

    async fn send_check_summary(&self, outcomes: &[CheckOutcome]) -> Result<(), NotifyError> {
        let Some(url) = self.active_webhook()? else {
            return Ok(());
        };
        self.post(
            &url,
            &WebhookPayload {
                content: None,
                embeds: vec![summary_embed(outcomes)],
            },
        )
        .await
    }

    async fn send_degraded_status_alert(
        &self,
        shipment: &Shipment,
        previous_status: &str,
    ) -> Result<(), NotifyError> {
        let Some(url) = self.active_webhook()? else {
            return Ok(());
        };
        self.post(
            &url,
            &WebhookPayload {
                content: None,
                embeds: vec![degraded_embed(shipment, previous_status)],
            },
        )
        .await
    }

    async fn send_test_message(&self, channel: NotifyChannel) -> Result<(), NotifyError> {
        if channel != NotifyChannel::Discord {
            return Err(NotifyError::Unsupported(channel));
        }
        if !self.is_enabled()? {
            return Err(NotifyError::Configuration(
                "Discord notifications are disabled. Enable them in settings first.".to_string(),
            ));
        }
        let url = self.webhook_url()?.ok_or_else(|| {
            NotifyError::Configuration("Discord webhook URL not configured".to_string())
        })?;
        self.post(
            &url,
            &WebhookPayload {
                content: None,
                embeds: vec![test_embed()],
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::Carrier;
    use crate::shipment::{NewShipment, SqliteShipmentStore};
    use crate::tracker::CheckResultSummary;

    fn notifier(fallback: Option<&str>) -> (DiscordNotifier, Arc<SqliteShipmentStore>) {
        let store = Arc::new(SqliteShipmentStore::in_memory().unwrap());
        let config = NotificationsConfig {
            discord_webhook_url: fallback.map(String::from),
            ..Default::default()
        };
        let notifier = DiscordNotifier::new(store.clone(), &config).unwrap();
        (notifier, store)
    }

    fn shipment(store: &SqliteShipmentStore) -> Shipment {
        let mut s = store
            .create(
                NewShipment::new("https://www.ups.com/track?tracknum=1Z999AA10123456784")
                    .with_notify_discord(true),
            )
            .unwrap();
        s.carrier = Some(Carrier::Ups);
        s
    }

    #[test]
    fn test_enabled_requires_exact_true() {
        let (notifier, store) = notifier(None);
        assert!(!notifier.is_enabled().unwrap());
        store.set_setting(DISCORD_ENABLED_SETTING, "yes").unwrap();
        assert!(!notifier.is_enabled().unwrap());
        store.set_setting(DISCORD_ENABLED_SETTING, "true").unwrap();
        assert!(notifier.is_enabled().unwrap());
    }

    #[test]
    fn test_saved_webhook_overrides_config() {
        let (notifier, store) = notifier(Some("https://discord.test/config"));
        assert_eq!(
            notifier.webhook_url().unwrap().as_deref(),
            Some("https://discord.test/config")
        );

        store
            .set_setting(DISCORD_WEBHOOK_SETTING, "https://discord.test/saved")
            .unwrap();
        assert_eq!(
            notifier.webhook_url().unwrap().as_deref(),
            Some("https://discord.test/saved")
        );

        store.set_setting(DISCORD_WEBHOOK_SETTING, "  ").unwrap();
        assert_eq!(
            notifier.webhook_url().unwrap().as_deref(),
            Some("https://discord.test/config")
        );
    }

    #[tokio::test]
    async fn test_disabled_skips_scheduled_traffic() {
        let (notifier, store) = notifier(Some("http://127.0.0.1:9/unreachable"));
        let s = shipment(&store);

        assert!(notifier.send_check_summary(&[]).await.is_ok());
        assert!(notifier
            .send_degraded_status_alert(&s, "In Transit")
            .await
            .is_ok());
        assert!(notifier
            .send_delivery_alert(NotifyChannel::Discord, &s, "Delivered")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_email_channel_is_unsupported() {
        let (notifier, store) = notifier(None);
        let s = shipment(&store);
        let err = notifier
            .send_delivery_alert(NotifyChannel::Email, &s, "Delivered")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Unsupported(NotifyChannel::Email)));
    }

    #[tokio::test]
    async fn test_test_message_reports_configuration_errors() {
        let (notifier, store) = notifier(None);
        let err = notifier
            .send_test_message(NotifyChannel::Discord)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(ref m) if m.contains("disabled")));

        store.set_setting(DISCORD_ENABLED_SETTING, "true").unwrap();
        let err = notifier
            .send_test_message(NotifyChannel::Discord)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(ref m) if m.contains("URL")));
    }

    #[tokio::test]
    async fn test_email_test_message_is_unsupported() {
        let (notifier, _store) = notifier(Some("https://discord.test/config"));
        let err = notifier
            .send_test_message(NotifyChannel::Email)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Unsupported(NotifyChannel::Email)));
    }

    #[test]
    fn test_delivery_embed_fields() {
        let store = SqliteShipmentStore::in_memory().unwrap();
        let mut s = shipment(&store);
        s.tracking_number = Some("1Z999AA10123456784".to_string());

        let json = serde_json::to_value(delivery_embed(&s, "Delivered")).unwrap();
        assert_eq!(json["title"], "Package Delivered!");
        assert_eq!(json["url"], s.tracking_url.as_str());
        assert_eq!(json["fields"][0]["value"], "Unknown Package");
        assert_eq!(json["fields"][1]["value"], "UPS");
        assert_eq!(json["fields"][3]["value"], "1Z999AA10123456784");
        assert_eq!(json["footer"]["text"], "Shipping Monitor");
    }

    #[test]
    fn test_degraded_embed_names_package() {
        let store = SqliteShipmentStore::in_memory().unwrap();
        let s = shipment(&store);
        let json = serde_json::to_value(degraded_embed(&s, "In Transit")).unwrap();
        assert!(json["description"]
            .as_str()
            .unwrap()
            .contains(&format!("Package #{}", s.id)));
        assert_eq!(json["fields"][0]["value"], "In Transit");
        assert_eq!(json["fields"][2]["value"], "N/A");
    }

    #[test]
    fn test_summary_embed_color_and_fields() {
        let empty = serde_json::to_value(summary_embed(&[])).unwrap();
        assert_eq!(empty["fields"].as_array().unwrap().len(), 1);
        assert_eq!(empty["fields"][0]["value"], "No active shipments to check");
        assert_eq!(empty["color"], COLOR_INFO);

        let failed = vec![CheckOutcome::Failed {
            shipment_id: 3,
            error: "timed out".to_string(),
        }];
        let json = serde_json::to_value(summary_embed(&failed)).unwrap();
        assert_eq!(json["color"], COLOR_ERROR);
        assert_eq!(json["fields"][1]["value"], "• **#3** - Error: timed out");

        let changed = vec![CheckOutcome::Checked(CheckResultSummary {
            shipment_id: 1,
            carrier: Carrier::Fedex,
            tracking_number: None,
            status: "Out for Delivery".to_string(),
            is_delivered: false,
            status_changed: true,
            events_found: 0,
            checked_at: Utc::now(),
        })];
        let json = serde_json::to_value(summary_embed(&changed)).unwrap();
        assert_eq!(json["color"], COLOR_WARNING);
    }
}
