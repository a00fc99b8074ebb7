//! SMTP email notifier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use super::{NotifyChannel, NotifyError, Notifier};
use crate::config::NotificationsConfig;
use crate::shipment::{
    Shipment, ShipmentStore, EMAIL_ENABLED_SETTING, NOTIFICATION_EMAIL_SETTING,
    SMTP_HOST_SETTING, SMTP_PASS_SETTING, SMTP_PORT_SETTING, SMTP_USER_SETTING,
};
use crate::tracker::CheckOutcome;

/// Resolved SMTP account and recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub to: String,
}

/// Sends delivery alerts by email.
///
/// SMTP settings and the recipient are read from persisted settings on every
/// send, falling back to the configured values. Only delivery alerts and
/// test messages go out by email; summaries and degraded alerts are ignored.
pub struct EmailNotifier {
    store: Arc<dyn ShipmentStore>,
    fallback: NotificationsConfig,
    timeout: Duration,
}

impl EmailNotifier {
    pub fn new(store: Arc<dyn ShipmentStore>, config: &NotificationsConfig) -> Self {
        Self {
            store,
            fallback: config.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn setting(&self, key: &str) -> Result<Option<String>, NotifyError> {
        let value = self
            .store
            .get_setting(key)
            .map_err(|e| NotifyError::Configuration(format!("cannot read settings: {}", e)))?;
        Ok(value.filter(|v| !v.trim().is_empty()))
    }

    fn setting_or(&self, key: &str, fallback: &Option<String>) -> Result<Option<String>, NotifyError> {
        Ok(self
            .setting(key)?
            .or_else(|| fallback.clone())
            .filter(|v| !v.trim().is_empty()))
    }

    /// Email is enabled only when the setting is exactly `"true"`.
    pub fn is_enabled(&self) -> Result<bool, NotifyError> {
        Ok(self.setting(EMAIL_ENABLED_SETTING)?.as_deref() == Some("true"))
    }

    /// SMTP account and recipient; a missing piece is a configuration error.
    pub fn smtp_settings(&self) -> Result<SmtpSettings, NotifyError> {
        let host = self.setting_or(SMTP_HOST_SETTING, &self.fallback.smtp_host)?;
        let user = self.setting_or(SMTP_USER_SETTING, &self.fallback.smtp_user)?;
        let pass = self.setting_or(SMTP_PASS_SETTING, &self.fallback.smtp_pass)?;
        let port = self
            .setting(SMTP_PORT_SETTING)?
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(self.fallback.smtp_port);

        let (Some(host), Some(user), Some(pass)) = (host, user, pass) else {
            return Err(NotifyError::Configuration(
                "Email not configured. Please set SMTP settings.".to_string(),
            ));
        };
        let to = self
            .setting_or(NOTIFICATION_EMAIL_SETTING, &self.fallback.notification_email)?
            .ok_or_else(|| {
                NotifyError::Configuration("No notification email configured".to_string())
            })?;

        Ok(SmtpSettings {
            host,
            port,
            user,
            pass,
            to,
        })
    }

    async fn send(
        &self,
        settings: &SmtpSettings,
        subject: &str,
        html: String,
    ) -> Result<(), NotifyError> {
        let from: Mailbox = settings
            .user
            .parse()
            .map_err(|e| NotifyError::Configuration(format!("invalid sender address: {}", e)))?;
        let to: Mailbox = settings
            .to
            .parse()
            .map_err(|e| NotifyError::Configuration(format!("invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| NotifyError::Configuration(format!("cannot build email: {}", e)))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| NotifyError::Http(format!("SMTP setup failed: {}", e)))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.pass.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Http(format!("SMTP send failed: {}", e)))?;
        Ok(())
    }
}

fn delivery_subject(shipment: &Shipment) -> String {
    let name = shipment
        .friendly_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| shipment.tracking_number.clone())
        .unwrap_or_else(|| shipment.display_name());
    format!("Package Delivered: {}", name)
}

fn delivery_html(shipment: &Shipment, status: &str) -> String {
    let name = shipment
        .friendly_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Your Package");
    let carrier = shipment
        .carrier
        .map(|c| c.as_str().to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string());

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #22c55e;">Package Delivered!</h2>
  <div style="background: #f3f4f6; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin: 0 0 10px 0;">{name}</h3>
    <p style="margin: 5px 0;"><strong>Carrier:</strong> {carrier}</p>
    <p style="margin: 5px 0;"><strong>Tracking Number:</strong> {number}</p>
    <p style="margin: 5px 0;"><strong>Status:</strong> {status}</p>
  </div>
  <p><a href="{url}">View Tracking Details</a></p>
  <p style="color: #6b7280; font-size: 12px; margin-top: 30px;">Sent by Shipping Monitor</p>
</div>"#,
        name = escape_html(name),
        carrier = carrier,
        number = escape_html(shipment.tracking_number.as_deref().unwrap_or("N/A")),
        status = escape_html(status),
        url = escape_html(&shipment.tracking_url),
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const TEST_HTML: &str = r#"<div style="font-family: Arial, sans-serif;">
  <h2>Test Email</h2>
  <p>Your email notifications are configured correctly!</p>
  <p style="color: #6b7280; font-size: 12px;">Sent by Shipping Monitor</p>
</div>"#;

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_delivery_alert(
        &self,
        channel: NotifyChannel,
        shipment: &Shipment,
        status: &str,
    ) -> Result<(), NotifyError> {
        if channel != NotifyChannel::Email {
            return Err(NotifyError::Unsupported(channel));
        }
        if !self.is_enabled()? {
            debug!(shipment_id = shipment.id, "Email notifications disabled");
            return Ok(());
        }
        let settings = self.smtp_settings()?;
        self.send(
            &settings,
            &delivery_subject(shipment),
            delivery_html(shipment, status),
        )
        .await?;
        info!(shipment_id = shipment.id, "Email delivery notification sent");
        Ok(())
    }

    async fn send_check_summary(&self, _outcomes: &[CheckOutcome]) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_degraded_status_alert(
        &self,
        _shipment: &Shipment,
        _previous_status: &str,
    ) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_test_message(&self, channel: NotifyChannel) -> Result<(), NotifyError> {
        if channel != NotifyChannel::Email {
            return Err(NotifyError::Unsupported(channel));
        }
        if !self.is_enabled()? {
            return Err(NotifyError::Configuration(
                "Email notifications are disabled. Enable them in settings first.".to_string(),
            ));
        }
        let settings = self.smtp_settings()?;
        self.send(
            &settings,
            "Shipping Monitor - Test Email",
            TEST_HTML.to_string(),
        )
        .await
    }
}
