use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

pub use crate::queue::QueueConfig;
pub use crate::scheduler::SchedulerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("shiptrack.db")
}

/// HTTP settings for the generic tracking provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Fixed user agent. When unset, a small set of browser agents is rotated.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            user_agent: None,
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// Notification delivery configuration.
///
/// Persisted settings (`discord_webhook_url`, `discord_enabled`, `smtp_*`,
/// `notification_email`, `email_enabled`) take precedence over these values
/// at send time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
    /// Webhook request timeout in seconds (default: 10)
    #[serde(default = "default_webhook_timeout")]
    pub request_timeout_secs: u64,
    /// Only log notifications instead of sending them.
    #[serde(default)]
    pub log_only: bool,
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP submission port (default: 587, STARTTLS)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_pass: Option<String>,
    /// Recipient of email notifications.
    #[serde(default)]
    pub notification_email: Option<String>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            discord_webhook_url: None,
            request_timeout_secs: default_webhook_timeout(),
            log_only: false,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_user: None,
            smtp_pass: None,
            notification_email: None,
        }
    }
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_smtp_port() -> u16 {
    587
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub scheduler: SchedulerConfig,
    pub provider: ProviderConfig,
    pub discord_webhook_configured: bool,
    pub smtp_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            queue: config.queue.clone(),
            scheduler: config.scheduler.clone(),
            provider: config.provider.clone(),
            discord_webhook_configured: config
                .notifications
                .discord_webhook_url
                .as_deref()
                .is_some_and(|url| !url.is_empty()),
            smtp_configured: config
                .notifications
                .smtp_host
                .as_deref()
                .is_some_and(|host| !host.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "shiptrack.db");
        assert_eq!(config.provider.request_timeout_secs, 30);
        assert!(config.notifications.discord_webhook_url.is_none());
    }

    #[test]
    fn test_deserialize_with_custom_database_path() {
        let toml = r#"
[database]
path = "/data/shipments.sqlite"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.database.path.to_str().unwrap(),
            "/data/shipments.sqlite"
        );
    }

    #[test]
    fn test_deserialize_provider_and_notifications() {
        let toml = r#"
[provider]
request_timeout_secs = 10
user_agent = "shiptrack/0.1"

[notifications]
discord_webhook_url = "https://discord.com/api/webhooks/1/abc"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.provider.request_timeout_secs, 10);
        assert_eq!(config.provider.user_agent.as_deref(), Some("shiptrack/0.1"));
        assert!(config.notifications.discord_webhook_url.is_some());
        assert_eq!(config.notifications.request_timeout_secs, 10);
        assert!(!config.notifications.log_only);
        assert_eq!(config.notifications.smtp_port, 587);
    }

    #[test]
    fn test_sanitized_config_hides_smtp_password() {
        let toml = r#"
[notifications]
smtp_host = "smtp.example.com"
smtp_user = "monitor@example.com"
smtp_pass = "hunter2"
notification_email = "me@example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.smtp_configured);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_sanitized_config_hides_webhook() {
        let mut config = Config::default();
        config.notifications.discord_webhook_url =
            Some("https://discord.com/api/webhooks/1/secret".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.discord_webhook_configured);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_sanitized_config_empty_webhook() {
        let mut config = Config::default();
        config.notifications.discord_webhook_url = Some(String::new());
        assert!(!SanitizedConfig::from(&config).discord_webhook_configured);
    }
}
