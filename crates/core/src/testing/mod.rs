//! Testing utilities and mock implementations.
//!
//! Mocks for the provider, store and notifier seams, so the tracker and
//! scheduler can be exercised without network access or a database file.
//!
//! # Example
//!
//! ```rust,ignore
//! use shiptrack_core::testing::{fixtures, MockNotifier, MockProvider, MockShipmentStore};
//!
//! let store = MockShipmentStore::new();
//! store.insert(fixtures::ups_shipment(7));
//!
//! let provider = MockProvider::named("ups");
//! provider.push_result(fixtures::tracking_result("In Transit", false)).await;
//!
//! // Build a ShipmentTracker from the mocks...
//! ```

mod mock_notifier;
mod mock_provider;
mod mock_store;

pub use mock_notifier::{MockNotifier, Notification};
pub use mock_provider::{MockProvider, RecordedTrack};
pub use mock_store::MockShipmentStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::carrier::{Carrier, PENDING_FIRST_CHECK};
    use crate::provider::{TrackingEvent, TrackingResult};
    use crate::shipment::Shipment;

    /// UPS tracking URL used across tests.
    pub const UPS_URL: &str = "https://www.ups.com/track?tracknum=1Z999AA10123456784";

    /// An unresolved shipment awaiting its first check.
    pub fn shipment(id: i64, tracking_url: &str) -> Shipment {
        Shipment {
            id,
            tracking_url: tracking_url.to_string(),
            carrier: None,
            tracking_number: None,
            friendly_name: None,
            current_status: Some(PENDING_FIRST_CHECK.to_string()),
            is_delivered: false,
            last_checked_at: None,
            last_status_change_at: None,
            notify_email: false,
            notify_discord: false,
            created_at: Utc::now(),
        }
    }

    /// A resolved UPS shipment awaiting its first check.
    pub fn ups_shipment(id: i64) -> Shipment {
        Shipment {
            carrier: Some(Carrier::Ups),
            tracking_number: Some("1Z999AA10123456784".to_string()),
            ..shipment(id, UPS_URL)
        }
    }

    /// A provider result with no events.
    pub fn tracking_result(status: &str, delivered: bool) -> TrackingResult {
        TrackingResult {
            carrier: Carrier::Ups,
            status: status.to_string(),
            is_delivered: delivered,
            events: Vec::new(),
            raw_data: None,
            checked_at: Utc::now(),
        }
    }

    /// A dated tracking event.
    pub fn event(status: &str, timestamp: &str) -> TrackingEvent {
        TrackingEvent::new(status, Some(timestamp))
    }
}
