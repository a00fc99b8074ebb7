//! Normalized provider result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::carrier::{Carrier, UNKNOWN_STATUS};

/// Errors a provider may raise. These count as carrier failures in the queue.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Transport-level failure (DNS, connect, HTTP status).
    #[error("network error: {0}")]
    Network(String),

    /// The response could not be interpreted at all.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider cannot serve requests right now.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// One discrete event in a carrier's tracking timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Carrier-formatted timestamp, kept verbatim.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl TrackingEvent {
    pub fn new(status: impl Into<String>, timestamp: Option<&str>) -> Self {
        Self {
            status: status.into(),
            location: None,
            timestamp: timestamp.map(String::from),
            details: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A provider's answer to one check attempt, before normalization.
#[derive(Debug, Clone)]
pub struct TrackingResult {
    pub carrier: Carrier,
    /// Raw status text as reported by the carrier.
    pub status: String,
    pub is_delivered: bool,
    pub events: Vec<TrackingEvent>,
    /// Opaque payload passed through to history rows.
    pub raw_data: Option<Vec<u8>>,
    pub checked_at: DateTime<Utc>,
}

impl TrackingResult {
    /// Build a result the way carrier providers do: delivery is derived from
    /// the status text and an empty status becomes `Unknown`.
    pub fn from_status(carrier: Carrier, status: Option<&str>) -> Self {
        let status = status
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN_STATUS)
            .to_string();
        Self {
            carrier,
            is_delivered: is_delivered_status(&status),
            status,
            events: Vec::new(),
            raw_data: None,
            checked_at: Utc::now(),
        }
    }

    /// Result for "could not determine anything".
    pub fn unknown(carrier: Carrier) -> Self {
        Self::from_status(carrier, None)
    }

    pub fn with_events(mut self, events: Vec<TrackingEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_raw_data(mut self, raw_data: Vec<u8>) -> Self {
        self.raw_data = Some(raw_data);
        self
    }
}

/// Whether a raw status text reports a completed delivery.
pub fn is_delivered_status(status: &str) -> bool {
    let lower = status.to_lowercase();
    lower.contains("delivered") && !lower.contains("not delivered")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_derives_delivery() {
        let result = TrackingResult::from_status(Carrier::Ups, Some("Delivered, front porch"));
        assert!(result.is_delivered);
        assert_eq!(result.status, "Delivered, front porch");

        let result = TrackingResult::from_status(Carrier::Ups, Some("Not delivered - no access"));
        assert!(!result.is_delivered);
    }

    #[test]
    fn test_unknown_result() {
        let result = TrackingResult::unknown(Carrier::Dhl);
        assert_eq!(result.status, UNKNOWN_STATUS);
        assert!(!result.is_delivered);
        assert!(result.events.is_empty());

        let blank = TrackingResult::from_status(Carrier::Dhl, Some("   "));
        assert_eq!(blank.status, UNKNOWN_STATUS);
    }

    #[test]
    fn test_event_builder() {
        let event = TrackingEvent::new("Departed Facility", Some("2024-01-01T10:00:00Z"))
            .with_location("Louisville, KY")
            .with_details("Departed from facility");
        assert_eq!(event.location.as_deref(), Some("Louisville, KY"));
        assert_eq!(event.timestamp.as_deref(), Some("2024-01-01T10:00:00Z"));
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "network error: connection refused");
    }
}
