//! Shipment storage trait.

use thiserror::Error;

use super::{NewHistoryEvent, NewShipment, Shipment, ShipmentUpdate, StatusHistoryEvent};

/// Error type for store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Shipment not found.
    #[error("shipment not found: {0}")]
    NotFound(i64),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// A stored value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Trait for shipment storage backends.
///
/// Each call is atomic on its own; callers never need multi-call
/// transactions.
pub trait ShipmentStore: Send + Sync {
    /// Get a shipment by ID.
    fn get_by_id(&self, id: i64) -> Result<Option<Shipment>, StoreError>;

    /// All shipments that are not delivered yet, oldest first.
    fn get_active(&self) -> Result<Vec<Shipment>, StoreError>;

    /// Create a shipment. Its status starts as the pending sentinel.
    fn create(&self, shipment: NewShipment) -> Result<Shipment, StoreError>;

    /// Apply a partial update. Returns false if nothing was updated.
    fn update(&self, id: i64, update: &ShipmentUpdate) -> Result<bool, StoreError>;

    /// History rows for a shipment, newest first.
    fn get_history(&self, shipment_id: i64) -> Result<Vec<StatusHistoryEvent>, StoreError>;

    /// Append a history row and return its ID.
    fn add_history(&self, event: NewHistoryEvent) -> Result<i64, StoreError>;

    /// Read a persisted setting.
    fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or replace a persisted setting.
    fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
