//! Mock shipment store for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::carrier::PENDING_FIRST_CHECK;
use crate::shipment::{
    NewHistoryEvent, NewShipment, Shipment, ShipmentStore, ShipmentUpdate, StatusHistoryEvent,
    StoreError,
};

#[derive(Default)]
struct Inner {
    shipments: HashMap<i64, Shipment>,
    history: Vec<StatusHistoryEvent>,
    settings: HashMap<String, String>,
    updates: Vec<(i64, ShipmentUpdate)>,
}

/// In-memory implementation of the ShipmentStore trait.
///
/// Records every update for assertions and can be switched into a failing
/// mode where every call returns a database error.
pub struct MockShipmentStore {
    inner: Arc<Mutex<Inner>>,
    next_id: AtomicI64,
    fail: AtomicBool,
}

impl std::fmt::Debug for MockShipmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockShipmentStore")
            .field("inner", &"<inner>")
            .field("fail", &self.fail.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for MockShipmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockShipmentStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            next_id: AtomicI64::new(1),
            fail: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_fail(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Database("mock store failure".to_string()));
        }
        Ok(())
    }

    /// Insert a ready-made shipment, keeping its ID.
    pub fn insert(&self, shipment: Shipment) {
        self.next_id.fetch_max(shipment.id + 1, Ordering::SeqCst);
        self.lock().shipments.insert(shipment.id, shipment);
    }

    /// Make every subsequent call fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All updates applied so far, in order.
    pub fn updates(&self) -> Vec<(i64, ShipmentUpdate)> {
        self.lock().updates.clone()
    }

    /// Current record, bypassing the failure switch.
    pub fn shipment(&self, id: i64) -> Option<Shipment> {
        self.lock().shipments.get(&id).cloned()
    }

    /// History rows for a shipment in insertion order.
    pub fn history(&self, shipment_id: i64) -> Vec<StatusHistoryEvent> {
        self.lock()
            .history
            .iter()
            .filter(|e| e.shipment_id == shipment_id)
            .cloned()
            .collect()
    }
}

impl ShipmentStore for MockShipmentStore {
    fn get_by_id(&self, id: i64) -> Result<Option<Shipment>, StoreError> {
        self.check_fail()?;
        Ok(self.lock().shipments.get(&id).cloned())
    }

    fn get_active(&self) -> Result<Vec<Shipment>, StoreError> {
        self.check_fail()?;
        let mut active: Vec<_> = self
            .lock()
            .shipments
            .values()
            .filter(|s| !s.is_delivered)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.id);
        Ok(active)
    }

    fn create(&self, shipment: NewShipment) -> Result<Shipment, StoreError> {
        self.check_fail()?;
        let created = Shipment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            tracking_url: shipment.tracking_url,
            carrier: shipment.carrier,
            tracking_number: shipment.tracking_number,
            friendly_name: shipment.friendly_name,
            current_status: Some(PENDING_FIRST_CHECK.to_string()),
            is_delivered: false,
            last_checked_at: None,
            last_status_change_at: None,
            notify_email: shipment.notify_email,
            notify_discord: shipment.notify_discord,
            created_at: Utc::now(),
        };
        self.lock().shipments.insert(created.id, created.clone());
        Ok(created)
    }

    fn update(&self, id: i64, update: &ShipmentUpdate) -> Result<bool, StoreError> {
        self.check_fail()?;
        if update.is_empty() {
            return Ok(false);
        }
        let mut inner = self.lock();
        let Some(shipment) = inner.shipments.get_mut(&id) else {
            return Ok(false);
        };
        update.apply(shipment);
        inner.updates.push((id, update.clone()));
        Ok(true)
    }

    fn get_history(&self, shipment_id: i64) -> Result<Vec<StatusHistoryEvent>, StoreError> {
        self.check_fail()?;
        let mut events = self.history(shipment_id);
        events.reverse();
        Ok(events)
    }

    fn add_history(&self, event: NewHistoryEvent) -> Result<i64, StoreError> {
        self.check_fail()?;
        let mut inner = self.lock();
        let id = inner.history.len() as i64 + 1;
        inner.history.push(StatusHistoryEvent {
            id,
            shipment_id: event.shipment_id,
            status: event.status,
            location: event.location,
            details: event.details,
            timestamp: event.timestamp,
            raw_data: event.raw_data,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_fail()?;
        Ok(self.lock().settings.get(key).cloned())
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_fail()?;
        self.lock()
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_update_is_recorded_and_applied() {
        let store = MockShipmentStore::new();
        store.insert(fixtures::ups_shipment(7));

        let update = ShipmentUpdate::new().with_current_status("In Transit");
        assert!(store.update(7, &update).unwrap());
        assert!(!store.update(8, &update).unwrap());

        assert_eq!(store.updates(), vec![(7, update)]);
        assert_eq!(
            store.shipment(7).unwrap().current_status.as_deref(),
            Some("In Transit")
        );
    }

    #[test]
    fn test_failure_switch() {
        let store = MockShipmentStore::new();
        store.set_fail(true);
        assert!(matches!(store.get_active(), Err(StoreError::Database(_))));
        store.set_fail(false);
        assert!(store.get_active().unwrap().is_empty());
    }

    #[test]
    fn test_create_after_insert_uses_fresh_id() {
        let store = MockShipmentStore::new();
        store.insert(fixtures::ups_shipment(7));
        let created = store.create(NewShipment::new(fixtures::UPS_URL)).unwrap();
        assert_eq!(created.id, 8);
    }
}
