//! Shipment and history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::carrier::Carrier;

/// A tracked package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: i64,
    pub tracking_url: String,
    /// Unset until the carrier is resolved from the URL.
    pub carrier: Option<Carrier>,
    pub tracking_number: Option<String>,
    pub friendly_name: Option<String>,
    pub current_status: Option<String>,
    /// Once true, the shipment is never checked again.
    pub is_delivered: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_status_change_at: Option<DateTime<Utc>>,
    pub notify_email: bool,
    pub notify_discord: bool,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    /// Friendly name, or `Package #<id>` when none was given.
    pub fn display_name(&self) -> String {
        match &self.friendly_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Package #{}", self.id),
        }
    }
}

/// Request to create a shipment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewShipment {
    pub tracking_url: String,
    #[serde(default)]
    pub carrier: Option<Carrier>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub notify_email: bool,
    #[serde(default)]
    pub notify_discord: bool,
}

impl NewShipment {
    pub fn new(tracking_url: impl Into<String>) -> Self {
        Self {
            tracking_url: tracking_url.into(),
            ..Default::default()
        }
    }

    pub fn with_carrier(mut self, carrier: Carrier) -> Self {
        self.carrier = Some(carrier);
        self
    }

    pub fn with_tracking_number(mut self, tracking_number: impl Into<String>) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    pub fn with_notify_email(mut self, notify: bool) -> Self {
        self.notify_email = notify;
        self
    }

    pub fn with_notify_discord(mut self, notify: bool) -> Self {
        self.notify_discord = notify;
        self
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentUpdate {
    pub carrier: Option<Carrier>,
    pub tracking_number: Option<String>,
    pub friendly_name: Option<String>,
    pub current_status: Option<String>,
    pub is_delivered: Option<bool>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_status_change_at: Option<DateTime<Utc>>,
    pub notify_email: Option<bool>,
    pub notify_discord: Option<bool>,
}

impl ShipmentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_carrier(mut self, carrier: Carrier) -> Self {
        self.carrier = Some(carrier);
        self
    }

    pub fn with_tracking_number(mut self, tracking_number: impl Into<String>) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    pub fn with_current_status(mut self, status: impl Into<String>) -> Self {
        self.current_status = Some(status.into());
        self
    }

    pub fn with_delivered(mut self, delivered: bool) -> Self {
        self.is_delivered = Some(delivered);
        self
    }

    pub fn with_last_checked_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_checked_at = Some(at);
        self
    }

    pub fn with_last_status_change_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_status_change_at = Some(at);
        self
    }

    pub fn with_notify_email(mut self, notify: bool) -> Self {
        self.notify_email = Some(notify);
        self
    }

    pub fn with_notify_discord(mut self, notify: bool) -> Self {
        self.notify_discord = Some(notify);
        self
    }

    /// True when applying this update would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to an in-memory record.
    pub fn apply(&self, shipment: &mut Shipment) {
        if let Some(carrier) = self.carrier {
            shipment.carrier = Some(carrier);
        }
        if let Some(number) = &self.tracking_number {
            shipment.tracking_number = Some(number.clone());
        }
        if let Some(name) = &self.friendly_name {
            shipment.friendly_name = Some(name.clone());
        }
        if let Some(status) = &self.current_status {
            shipment.current_status = Some(status.clone());
        }
        if let Some(delivered) = self.is_delivered {
            shipment.is_delivered = delivered;
        }
        if let Some(at) = self.last_checked_at {
            shipment.last_checked_at = Some(at);
        }
        if let Some(at) = self.last_status_change_at {
            shipment.last_status_change_at = Some(at);
        }
        if let Some(notify) = self.notify_email {
            shipment.notify_email = notify;
        }
        if let Some(notify) = self.notify_discord {
            shipment.notify_discord = notify;
        }
    }
}

/// A stored history row. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusHistoryEvent {
    pub id: i64,
    pub shipment_id: i64,
    pub status: String,
    pub location: Option<String>,
    pub details: Option<String>,
    pub timestamp: Option<String>,
    #[serde(skip)]
    pub raw_data: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

impl StatusHistoryEvent {
    pub fn key(&self) -> (String, String) {
        history_key(&self.status, self.timestamp.as_deref())
    }
}

/// A history row to append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEvent {
    pub shipment_id: i64,
    pub status: String,
    pub location: Option<String>,
    pub details: Option<String>,
    pub timestamp: Option<String>,
    pub raw_data: Option<Vec<u8>>,
}

impl NewHistoryEvent {
    pub fn new(shipment_id: i64, status: impl Into<String>) -> Self {
        Self {
            shipment_id,
            status: status.into(),
            location: None,
            details: None,
            timestamp: None,
            raw_data: None,
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_raw_data(mut self, raw_data: Option<Vec<u8>>) -> Self {
        self.raw_data = raw_data;
        self
    }

    pub fn key(&self) -> (String, String) {
        history_key(&self.status, self.timestamp.as_deref())
    }
}

/// History dedup key. A missing timestamp keys as the empty string, so
/// undated events with the same status collide.
pub fn history_key(status: &str, timestamp: Option<&str>) -> (String, String) {
    (status.to_string(), timestamp.unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipment() -> Shipment {
        Shipment {
            id: 3,
            tracking_url: "https://www.ups.com/track?tracknum=1Z999AA10123456784".to_string(),
            carrier: None,
            tracking_number: None,
            friendly_name: None,
            current_status: None,
            is_delivered: false,
            last_checked_at: None,
            last_status_change_at: None,
            notify_email: false,
            notify_discord: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let mut s = shipment();
        assert_eq!(s.display_name(), "Package #3");
        s.friendly_name = Some("Keyboard".to_string());
        assert_eq!(s.display_name(), "Keyboard");
    }

    #[test]
    fn test_update_is_empty() {
        assert!(ShipmentUpdate::new().is_empty());
        assert!(!ShipmentUpdate::new().with_delivered(false).is_empty());
    }

    #[test]
    fn test_update_apply_touches_only_set_fields() {
        let mut s = shipment();
        s.friendly_name = Some("Lamp".to_string());
        ShipmentUpdate::new()
            .with_carrier(Carrier::Ups)
            .with_current_status("In Transit")
            .apply(&mut s);

        assert_eq!(s.carrier, Some(Carrier::Ups));
        assert_eq!(s.current_status.as_deref(), Some("In Transit"));
        assert_eq!(s.friendly_name.as_deref(), Some("Lamp"));
        assert!(!s.is_delivered);
    }

    #[test]
    fn test_history_key_treats_missing_timestamp_as_empty() {
        let dated = NewHistoryEvent::new(1, "Delivered").with_timestamp(Some("t1".to_string()));
        let undated = NewHistoryEvent::new(1, "Delivered");
        assert_eq!(dated.key(), ("Delivered".to_string(), "t1".to_string()));
        assert_eq!(undated.key(), history_key("Delivered", Some("")));
    }
}
