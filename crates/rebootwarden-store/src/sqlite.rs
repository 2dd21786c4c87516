//! SQLite-based store implementation
//!
//! The record is kept as named values in a single table, mirroring how the
//! same data would sit as individual values under a registry key.

use chrono::{DateTime, Local, SecondsFormat};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{PersistedState, StateStore, StoreError, StoreResult};

const LAST_NOTIFICATION_TIME: &str = "LastNotificationTime";
const SCHEDULED_REBOOT_TIME: &str = "ScheduledRebootTime";
const NOTIFICATION_COUNT: &str = "NotificationCount";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS state_values (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    #[cfg(test)]
    fn put_raw(&self, name: &str, value: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO state_values (name, value) VALUES (?, ?)",
            [name, value],
        )?;
        Ok(())
    }
}

fn parse_timestamp(name: &str, value: &str) -> StoreResult<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", name, e)))
}

fn format_timestamp(dt: &DateTime<Local>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, false)
}

impl StateStore for SqliteStore {
    fn load(&self) -> StoreResult<PersistedState> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT name, value FROM state_values")?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let value: String = row.get(1)?;
            Ok((name, value))
        })?;

        let mut state = PersistedState::default();
        for row in rows {
            let (name, value) = row?;
            match name.as_str() {
                LAST_NOTIFICATION_TIME => {
                    state.last_notification_time = Some(parse_timestamp(&name, &value)?);
                }
                SCHEDULED_REBOOT_TIME => {
                    state.scheduled_reboot_time = Some(parse_timestamp(&name, &value)?);
                }
                NOTIFICATION_COUNT => {
                    state.notification_count = value
                        .parse()
                        .map_err(|e| StoreError::Corrupt(format!("{}: {}", name, e)))?;
                }
                other => {
                    warn!(name = other, "Ignoring unknown state value");
                }
            }
        }

        Ok(state)
    }

    fn save(&self, state: &PersistedState) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM state_values", [])?;

        if let Some(at) = &state.last_notification_time {
            tx.execute(
                "INSERT INTO state_values (name, value) VALUES (?, ?)",
                [LAST_NOTIFICATION_TIME, format_timestamp(at).as_str()],
            )?;
        }
        if let Some(at) = &state.scheduled_reboot_time {
            tx.execute(
                "INSERT INTO state_values (name, value) VALUES (?, ?)",
                [SCHEDULED_REBOOT_TIME, format_timestamp(at).as_str()],
            )?;
        }
        tx.execute(
            "INSERT INTO state_values (name, value) VALUES (?, ?)",
            [NOTIFICATION_COUNT, state.notification_count.to_string().as_str()],
        )?;

        tx.commit()?;
        debug!("State saved");
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM state_values", [])?;
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let last = Local.timestamp_opt(1_750_000_000, 5_000).unwrap();
        let state = PersistedState {
            last_notification_time: Some(last),
            scheduled_reboot_time: Some(last + chrono::Duration::minutes(90)),
            notification_count: 12,
        };

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_save_replaces_whole_record() {
        let store = SqliteStore::in_memory().unwrap();
        let at = Local.with_ymd_and_hms(2025, 6, 10, 19, 0, 0).unwrap();

        store
            .save(&PersistedState {
                last_notification_time: Some(at),
                scheduled_reboot_time: Some(at),
                notification_count: 2,
            })
            .unwrap();

        let cleared = PersistedState {
            last_notification_time: Some(at),
            scheduled_reboot_time: None,
            notification_count: 2,
        };
        store.save(&cleared).unwrap();

        assert_eq!(store.load().unwrap(), cleared);
    }

    #[test]
    fn test_corrupt_value() {
        let store = SqliteStore::in_memory().unwrap();
        store.put_raw(NOTIFICATION_COUNT, "many").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));

        store.put_raw(NOTIFICATION_COUNT, "1").unwrap();
        store.put_raw(SCHEDULED_REBOOT_TIME, "tonight").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_clear() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .save(&PersistedState {
                notification_count: 5,
                ..Default::default()
            })
            .unwrap();

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        let state = PersistedState {
            notification_count: 7,
            ..Default::default()
        };

        SqliteStore::open(&path).unwrap().save(&state).unwrap();
        assert_eq!(SqliteStore::open(&path).unwrap().load().unwrap(), state);
    }
}
