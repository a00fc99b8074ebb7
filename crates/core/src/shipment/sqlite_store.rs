//! SQLite-backed shipment store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    NewHistoryEvent, NewShipment, Shipment, ShipmentStore, ShipmentUpdate, StatusHistoryEvent,
    StoreError,
};
use crate::carrier::{Carrier, PENDING_FIRST_CHECK};

const SHIPMENT_COLUMNS: &str = "id, tracking_url, carrier, tracking_number, friendly_name, \
     current_status, is_delivered, last_checked_at, last_status_change_at, notify_email, \
     notify_discord, created_at";

const HISTORY_COLUMNS: &str =
    "id, shipment_id, status, location, details, timestamp, raw_data, created_at";

/// SQLite-backed shipment store.
pub struct SqliteShipmentStore {
    conn: Mutex<Connection>,
}

/// Shipment row as stored, before timestamp decoding.
struct ShipmentRow {
    id: i64,
    tracking_url: String,
    carrier: Option<String>,
    tracking_number: Option<String>,
    friendly_name: Option<String>,
    current_status: Option<String>,
    is_delivered: bool,
    last_checked_at: Option<String>,
    last_status_change_at: Option<String>,
    notify_email: bool,
    notify_discord: bool,
    created_at: String,
}

impl ShipmentRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            tracking_url: row.get(1)?,
            carrier: row.get(2)?,
            tracking_number: row.get(3)?,
            friendly_name: row.get(4)?,
            current_status: row.get(5)?,
            is_delivered: row.get(6)?,
            last_checked_at: row.get(7)?,
            last_status_change_at: row.get(8)?,
            notify_email: row.get(9)?,
            notify_discord: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    fn into_shipment(self) -> Result<Shipment, StoreError> {
        Ok(Shipment {
            id: self.id,
            tracking_url: self.tracking_url,
            carrier: self.carrier.as_deref().map(Carrier::parse_lossy),
            tracking_number: self.tracking_number,
            friendly_name: self.friendly_name,
            current_status: self.current_status,
            is_delivered: self.is_delivered,
            last_checked_at: parse_optional_timestamp(self.last_checked_at)?,
            last_status_change_at: parse_optional_timestamp(self.last_status_change_at)?,
            notify_email: self.notify_email,
            notify_discord: self.notify_discord,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("invalid timestamp {:?}: {}", value, e)))
}

fn parse_optional_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    value.as_deref().map(parse_timestamp).transpose()
}

impl SqliteShipmentStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// All shipments, undelivered first, most recently changed first.
    pub fn list(&self) -> Result<Vec<Shipment>, StoreError> {
        let conn = self.conn()?;
        Self::query_shipments(
            &conn,
            &format!(
                "SELECT {} FROM shipments ORDER BY is_delivered ASC, last_status_change_at DESC, id DESC",
                SHIPMENT_COLUMNS
            ),
            &[],
        )
    }

    /// Delete a shipment and its history. Returns false if it did not exist.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM status_history WHERE shipment_id = ?",
            params![id],
        )?;
        let deleted = conn.execute("DELETE FROM shipments WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS shipments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tracking_url TEXT NOT NULL,
                carrier TEXT,
                tracking_number TEXT,
                friendly_name TEXT,
                current_status TEXT,
                is_delivered INTEGER NOT NULL DEFAULT 0,
                last_checked_at TEXT,
                last_status_change_at TEXT,
                notify_email INTEGER NOT NULL DEFAULT 0,
                notify_discord INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS status_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                shipment_id INTEGER NOT NULL REFERENCES shipments(id) ON DELETE CASCADE,
                status TEXT NOT NULL,
                location TEXT,
                details TEXT,
                timestamp TEXT,
                raw_data BLOB,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_shipments_delivered ON shipments(is_delivered);
            CREATE INDEX IF NOT EXISTS idx_history_shipment ON status_history(shipment_id);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn query_shipments(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Shipment>, StoreError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, ShipmentRow::from_row)?;

        let mut shipments = Vec::new();
        for row in rows {
            shipments.push(row?.into_shipment()?);
        }
        Ok(shipments)
    }

    fn row_to_history(row: &rusqlite::Row) -> rusqlite::Result<(StatusHistoryEvent, String)> {
        let created_at: String = row.get(7)?;
        let event = StatusHistoryEvent {
            id: row.get(0)?,
            shipment_id: row.get(1)?,
            status: row.get(2)?,
            location: row.get(3)?,
            details: row.get(4)?,
            timestamp: row.get(5)?,
            raw_data: row.get(6)?,
            created_at: DateTime::<Utc>::MIN_UTC,
        };
        Ok((event, created_at))
    }
}

impl ShipmentStore for SqliteShipmentStore {
    fn get_by_id(&self, id: i64) -> Result<Option<Shipment>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM shipments WHERE id = ?", SHIPMENT_COLUMNS),
                params![id],
                ShipmentRow::from_row,
            )
            .optional()?;
        row.map(ShipmentRow::into_shipment).transpose()
    }

    fn get_active(&self) -> Result<Vec<Shipment>, StoreError> {
        let conn = self.conn()?;
        Self::query_shipments(
            &conn,
            &format!(
                "SELECT {} FROM shipments WHERE is_delivered = 0 ORDER BY id ASC",
                SHIPMENT_COLUMNS
            ),
            &[],
        )
    }

    fn create(&self, shipment: NewShipment) -> Result<Shipment, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO shipments (tracking_url, carrier, tracking_number, friendly_name, current_status, notify_email, notify_discord, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                shipment.tracking_url,
                shipment.carrier.map(|c| c.as_str()),
                shipment.tracking_number,
                shipment.friendly_name,
                PENDING_FIRST_CHECK,
                shipment.notify_email,
                shipment.notify_discord,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Shipment {
            id: conn.last_insert_rowid(),
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
            created_at: now,
        })
    }

    fn update(&self, id: i64, update: &ShipmentUpdate) -> Result<bool, StoreError> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut fields: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(carrier) = update.carrier {
            fields.push("carrier = ?");
            values.push(Box::new(carrier.as_str()));
        }
        if let Some(ref number) = update.tracking_number {
            fields.push("tracking_number = ?");
            values.push(Box::new(number.clone()));
        }
        if let Some(ref name) = update.friendly_name {
            fields.push("friendly_name = ?");
            values.push(Box::new(name.clone()));
        }
        if let Some(ref status) = update.current_status {
            fields.push("current_status = ?");
            values.push(Box::new(status.clone()));
        }
        if let Some(delivered) = update.is_delivered {
            fields.push("is_delivered = ?");
            values.push(Box::new(delivered));
        }
        if let Some(at) = update.last_checked_at {
            fields.push("last_checked_at = ?");
            values.push(Box::new(at.to_rfc3339()));
        }
        if let Some(at) = update.last_status_change_at {
            fields.push("last_status_change_at = ?");
            values.push(Box::new(at.to_rfc3339()));
        }
        if let Some(notify) = update.notify_email {
            fields.push("notify_email = ?");
            values.push(Box::new(notify));
        }
        if let Some(notify) = update.notify_discord {
            fields.push("notify_discord = ?");
            values.push(Box::new(notify));
        }
        values.push(Box::new(id));

        let sql = format!("UPDATE shipments SET {} WHERE id = ?", fields.join(", "));
        let param_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();

        let conn = self.conn()?;
        let changed = conn.execute(&sql, param_refs.as_slice())?;
        Ok(changed > 0)
    }

    fn get_history(&self, shipment_id: i64) -> Result<Vec<StatusHistoryEvent>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM status_history WHERE shipment_id = ? ORDER BY timestamp DESC, created_at DESC, id DESC",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt.query_map(params![shipment_id], Self::row_to_history)?;

        let mut events = Vec::new();
        for row in rows {
            let (mut event, created_at) = row?;
            event.created_at = parse_timestamp(&created_at)?;
            events.push(event);
        }
        Ok(events)
    }

    fn add_history(&self, event: NewHistoryEvent) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO status_history (shipment_id, status, location, details, timestamp, raw_data, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                event.shipment_id,
                event.status,
                event.location,
                event.details,
                event.timestamp,
                event.raw_data,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> SqliteShipmentStore {
        SqliteShipmentStore::in_memory().unwrap()
    }

    fn ups() -> NewShipment {
        NewShipment::new("https://www.ups.com/track?tracknum=1Z999AA10123456784")
            .with_friendly_name("Headphones")
            .with_notify_discord(true)
    }

    #[test]
    fn test_create_and_get() {
        let store = store();
        let created = store.create(ups()).unwrap();

        let fetched = store.get_by_id(created.id).unwrap().unwrap();
        assert_eq!(fetched.tracking_url, created.tracking_url);
        assert_eq!(fetched.current_status.as_deref(), Some(PENDING_FIRST_CHECK));
        assert_eq!(fetched.friendly_name.as_deref(), Some("Headphones"));
        assert!(fetched.notify_discord);
        assert!(!fetched.notify_email);
        assert!(fetched.carrier.is_none());
        assert!(!fetched.is_delivered);
    }

    #[test]
    fn test_get_missing_returns_none() {
        assert!(store().get_by_id(99).unwrap().is_none());
    }

    #[test]
    fn test_update_partial_fields() {
        let store = store();
        let created = store.create(ups()).unwrap();
        let now = Utc::now();

        let updated = store
            .update(
                created.id,
                &ShipmentUpdate::new()
                    .with_carrier(Carrier::Ups)
                    .with_tracking_number("1Z999AA10123456784")
                    .with_current_status("In Transit")
                    .with_last_checked_at(now),
            )
            .unwrap();
        assert!(updated);

        let fetched = store.get_by_id(created.id).unwrap().unwrap();
        assert_eq!(fetched.carrier, Some(Carrier::Ups));
        assert_eq!(fetched.tracking_number.as_deref(), Some("1Z999AA10123456784"));
        assert_eq!(fetched.current_status.as_deref(), Some("In Transit"));
        assert_eq!(
            fetched.last_checked_at.map(|t| t.timestamp_millis()),
            Some(now.timestamp_millis())
        );
        assert!(fetched.last_status_change_at.is_none());
        assert_eq!(fetched.friendly_name.as_deref(), Some("Headphones"));
    }

    #[test]
    fn test_update_empty_or_missing_returns_false() {
        let store = store();
        let created = store.create(ups()).unwrap();
        assert!(!store.update(created.id, &ShipmentUpdate::new()).unwrap());
        assert!(!store
            .update(404, &ShipmentUpdate::new().with_delivered(true))
            .unwrap());
    }

    #[test]
    fn test_get_active_excludes_delivered() {
        let store = store();
        let a = store.create(ups()).unwrap();
        let b = store.create(NewShipment::new("https://www.fedex.com/fedextrack/?trknbr=123456789012")).unwrap();
        store
            .update(a.id, &ShipmentUpdate::new().with_delivered(true))
            .unwrap();

        let active = store.get_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);
        assert_eq!(store.list().unwrap().len(), 2);
        assert_eq!(store.list().unwrap()[0].id, b.id);
    }

    #[test]
    fn test_history_newest_first_with_raw_data() {
        let store = store();
        let s = store.create(ups()).unwrap();

        store
            .add_history(
                NewHistoryEvent::new(s.id, "Label Created")
                    .with_timestamp(Some("2024-01-01T08:00:00Z".to_string())),
            )
            .unwrap();
        store
            .add_history(
                NewHistoryEvent::new(s.id, "Departed Facility")
                    .with_timestamp(Some("2024-01-01T10:00:00Z".to_string()))
                    .with_location(Some("Louisville, KY".to_string()))
                    .with_raw_data(Some(b"{\"k\":1}".to_vec())),
            )
            .unwrap();

        let history = store.get_history(s.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, "Departed Facility");
        assert_eq!(history[0].location.as_deref(), Some("Louisville, KY"));
        assert_eq!(history[0].raw_data.as_deref(), Some(&b"{\"k\":1}"[..]));
        assert_eq!(history[1].status, "Label Created");
        assert!(history[1].raw_data.is_none());
    }

    #[test]
    fn test_history_keeps_missing_timestamp_null() {
        let store = store();
        let s = store.create(ups()).unwrap();
        store.add_history(NewHistoryEvent::new(s.id, "In Transit")).unwrap();

        let history = store.get_history(s.id).unwrap();
        assert!(history[0].timestamp.is_none());
        assert_eq!(history[0].key(), ("In Transit".to_string(), String::new()));
    }

    #[test]
    fn test_delete_removes_history() {
        let store = store();
        let s = store.create(ups()).unwrap();
        store.add_history(NewHistoryEvent::new(s.id, "In Transit")).unwrap();

        assert!(store.delete(s.id).unwrap());
        assert!(!store.delete(s.id).unwrap());
        assert!(store.get_history(s.id).unwrap().is_empty());
    }

    #[test]
    fn test_settings_upsert() {
        let store = store();
        assert!(store.get_setting("poll_interval_minutes").unwrap().is_none());

        store.set_setting("poll_interval_minutes", "15").unwrap();
        store.set_setting("poll_interval_minutes", "20").unwrap();
        assert_eq!(
            store.get_setting("poll_interval_minutes").unwrap().as_deref(),
            Some("20")
        );
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shiptrack.db");

        let id = {
            let store = SqliteShipmentStore::new(&path).unwrap();
            store.set_setting("discord_enabled", "true").unwrap();
            store.create(ups()).unwrap().id
        };

        let store = SqliteShipmentStore::new(&path).unwrap();
        assert!(store.get_by_id(id).unwrap().is_some());
        assert_eq!(
            store.get_setting("discord_enabled").unwrap().as_deref(),
            Some("true")
        );
    }
}
