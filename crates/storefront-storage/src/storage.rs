use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// String keys to string values, the same contract as browser localStorage
///
/// Writers overwrite, there is no merge. Whoever persists last wins.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// SQLite-backed storage
///
/// Every process that opens the same file sees the same keys. Each handle
/// owns one connection, which is what lets [`crate::StorageWatcher`] tell
/// our own writes apart from writes made by other views.
pub struct LocalStorage {
    conn: Mutex<Connection>,
    // Values this handle wrote since the watcher last looked
    own_writes: Mutex<HashMap<String, Option<String>>>,
}

/// Watched values, the data version and our own recent writes, read together
pub(crate) struct WatchSnapshot {
    pub data_version: i64,
    pub values: Vec<Option<String>>,
    pub own_writes: HashMap<String, Option<String>>,
}

impl LocalStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        // Another view may be mid-write; wait for it rather than failing
        conn.busy_timeout(Duration::from_secs(2))?;
        Self::init_schema(&conn)?;
        debug!("Opened local storage at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            own_writes: Mutex::new(HashMap::new()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            own_writes: Mutex::new(HashMap::new()),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// SQLite's `data_version` for this connection
    ///
    /// Only changes when some *other* connection commits to the file.
    pub fn data_version(&self) -> Result<i64> {
        let conn = self.lock()?;
        let version = conn.query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Read `keys` and drain this handle's recorded writes under one lock
    ///
    /// Writes record themselves while holding the connection, so nothing can
    /// slip in between the values read here and the writes drained.
    pub(crate) fn watch_snapshot(&self, keys: &[String]) -> Result<WatchSnapshot> {
        let conn = self.lock()?;
        let data_version = conn.query_row("PRAGMA data_version", [], |row| row.get(0))?;
        let values = keys
            .iter()
            .map(|key| read_value(&conn, key))
            .collect::<Result<Vec<_>>>()?;
        let own_writes = std::mem::take(&mut *self.own_writes_lock()?);

        Ok(WatchSnapshot {
            data_version,
            values,
            own_writes,
        })
    }

    fn own_writes_lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Option<String>>>> {
        self.own_writes.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM local_storage ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Drop every key
    pub fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM local_storage")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        drop(stmt);
        conn.execute("DELETE FROM local_storage", [])?;

        let mut own = self.own_writes_lock()?;
        for key in keys {
            own.insert(key, None);
        }
        Ok(())
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM local_storage WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        read_value(&conn, key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().timestamp_millis()],
        )?;
        self.own_writes_lock()?
            .insert(key.to_string(), Some(value.to_string()));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        self.own_writes_lock()?.insert(key.to_string(), None);
        Ok(())
    }
}

/// Process-local storage for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get_item("cart").unwrap(), None);

        store.set_item("cart", "[]").unwrap();
        assert_eq!(store.get_item("cart").unwrap().as_deref(), Some("[]"));

        store.set_item("cart", "[1]").unwrap();
        assert_eq!(store.get_item("cart").unwrap().as_deref(), Some("[1]"));

        store.remove_item("cart").unwrap();
        assert_eq!(store.get_item("cart").unwrap(), None);

        // removing a missing key is fine
        store.remove_item("cart").unwrap();
    }

    #[test]
    fn test_local_storage_contract() {
        let storage = LocalStorage::open_in_memory().unwrap();
        exercise(&storage);
    }

    #[test]
    fn test_memory_storage_contract() {
        let storage = MemoryStorage::new();
        exercise(&storage);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_keys_and_clear() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_item("theme", "dark").unwrap();
        storage.set_item("cart", "[]").unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["cart", "theme"]);

        storage.clear().unwrap();
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_two_handles_share_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");

        let first = LocalStorage::open(&path).unwrap();
        let second = LocalStorage::open(&path).unwrap();

        first.set_item("cart", "[{\"id\":1}]").unwrap();
        assert_eq!(
            second.get_item("cart").unwrap().as_deref(),
            Some("[{\"id\":1}]")
        );

        second.remove_item("cart").unwrap();
        assert_eq!(first.get_item("cart").unwrap(), None);
    }

    #[test]
    fn test_data_version_ignores_own_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");

        let mine = LocalStorage::open(&path).unwrap();
        let theirs = LocalStorage::open(&path).unwrap();

        let before = mine.data_version().unwrap();
        mine.set_item("cart", "[]").unwrap();
        assert_eq!(mine.data_version().unwrap(), before);

        theirs.set_item("cart", "[1]").unwrap();
        assert_ne!(mine.data_version().unwrap(), before);
    }

    #[test]
    fn test_snapshot_drains_own_writes() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_item("cart", "[1]").unwrap();
        storage.set_item("cart", "[2]").unwrap();
        storage.remove_item("theme").unwrap();

        let keys = vec!["cart".to_string()];
        let snapshot = storage.watch_snapshot(&keys).unwrap();
        assert_eq!(snapshot.values, vec![Some("[2]".to_string())]);
        assert_eq!(snapshot.own_writes.get("cart"), Some(&Some("[2]".to_string())));
        assert_eq!(snapshot.own_writes.get("theme"), Some(&None));

        let again = storage.watch_snapshot(&keys).unwrap();
        assert!(again.own_writes.is_empty());
    }
}
