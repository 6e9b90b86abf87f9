// Storage-change notifications between views
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, LocalStorage, Result};

const CHANNEL_CAPACITY: usize = 16;

/// A key changed because some other view wrote to the shared storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl StorageEvent {
    pub fn new(key: &str, old_value: Option<String>, new_value: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            old_value,
            new_value,
            observed_at: Utc::now(),
        }
    }
}

struct WatchedKey {
    last_seen: Option<String>,
    tx: broadcast::Sender<StorageEvent>,
}

/// Publishes [`StorageEvent`]s for keys changed by other connections
///
/// One broadcast channel per key. The watcher shares its view's
/// [`LocalStorage`] handle, so writes made through that handle never
/// produce events here.
pub struct StorageWatcher {
    storage: Arc<LocalStorage>,
    data_version: i64,
    keys: HashMap<String, WatchedKey>,
}

impl StorageWatcher {
    pub fn new(storage: Arc<LocalStorage>) -> Result<Self> {
        let data_version = storage.data_version()?;
        Ok(Self {
            storage,
            data_version,
            keys: HashMap::new(),
        })
    }

    /// Receive events for `key`
    pub fn subscribe(&mut self, key: &str) -> Result<broadcast::Receiver<StorageEvent>> {
        if let Some(watched) = self.keys.get(key) {
            return Ok(watched.tx.subscribe());
        }

        let last_seen = self.storage.get_item(key)?;
        let (tx, rx) = broadcast::channel(CHANNEL_CAPACITY);
        self.keys.insert(key.to_string(), WatchedKey { last_seen, tx });
        Ok(rx)
    }

    /// Check for foreign commits and publish what changed
    ///
    /// Returns the number of events published.
    pub fn poll(&mut self) -> Result<usize> {
        let keys: Vec<String> = self.keys.keys().cloned().collect();
        let snapshot = self.storage.watch_snapshot(&keys)?;

        // Our own writes are known state, never a change to report
        for (key, value) in snapshot.own_writes {
            if let Some(watched) = self.keys.get_mut(&key) {
                watched.last_seen = value;
            }
        }

        if snapshot.data_version == self.data_version {
            return Ok(0);
        }
        self.data_version = snapshot.data_version;

        let mut published = 0;
        for (key, current) in keys.iter().zip(snapshot.values) {
            let Some(watched) = self.keys.get_mut(key) else {
                continue;
            };
            if current == watched.last_seen {
                continue;
            }

            let event = StorageEvent::new(key, watched.last_seen.take(), current.clone());
            watched.last_seen = current;

            debug!("Storage key '{}' changed in another view", key);
            // No receivers is fine, the view may not care right now
            if watched.tx.send(event).is_ok() {
                published += 1;
            }
        }

        Ok(published)
    }

    /// Poll forever on a fixed interval
    pub async fn run(mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = self.poll() {
                warn!("Storage watcher poll failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_views() -> (tempfile::TempDir, Arc<LocalStorage>, Arc<LocalStorage>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");
        let a = Arc::new(LocalStorage::open(&path).unwrap());
        let b = Arc::new(LocalStorage::open(&path).unwrap());
        (dir, a, b)
    }

    #[test]
    fn test_foreign_write_is_published() {
        let (_dir, mine, theirs) = two_views();
        let mut watcher = StorageWatcher::new(mine).unwrap();
        let mut rx = watcher.subscribe("cart").unwrap();

        theirs.set_item("cart", "[1]").unwrap();
        assert_eq!(watcher.poll().unwrap(), 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.key, "cart");
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value.as_deref(), Some("[1]"));
    }

    #[test]
    fn test_own_write_is_not_published() {
        let (_dir, mine, _theirs) = two_views();
        let mut watcher = StorageWatcher::new(mine.clone()).unwrap();
        let mut rx = watcher.subscribe("cart").unwrap();

        mine.set_item("cart", "[1]").unwrap();
        assert_eq!(watcher.poll().unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_foreign_removal_is_published() {
        let (_dir, mine, theirs) = two_views();
        theirs.set_item("cart", "[1]").unwrap();

        let mut watcher = StorageWatcher::new(mine).unwrap();
        let mut rx = watcher.subscribe("cart").unwrap();

        theirs.remove_item("cart").unwrap();
        watcher.poll().unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.old_value.as_deref(), Some("[1]"));
        assert_eq!(event.new_value, None);
    }

    #[test]
    fn test_unwatched_keys_are_ignored() {
        let (_dir, mine, theirs) = two_views();
        let mut watcher = StorageWatcher::new(mine).unwrap();
        let mut rx = watcher.subscribe("cart").unwrap();

        theirs.set_item("theme", "light").unwrap();
        assert_eq!(watcher.poll().unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_foreign_revert_after_own_write_is_published() {
        let (_dir, mine, theirs) = two_views();
        let mut watcher = StorageWatcher::new(mine.clone()).unwrap();
        let mut rx = watcher.subscribe("cart").unwrap();

        // we fill the cart, another view checks out back to nothing
        mine.set_item("cart", "[1]").unwrap();
        theirs.remove_item("cart").unwrap();

        assert_eq!(watcher.poll().unwrap(), 1);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.old_value.as_deref(), Some("[1]"));
        assert_eq!(event.new_value, None);
    }

    #[test]
    fn test_own_write_not_echoed_by_unrelated_foreign_commit() {
        let (_dir, mine, theirs) = two_views();
        let mut watcher = StorageWatcher::new(mine.clone()).unwrap();
        let mut rx = watcher.subscribe("cart").unwrap();

        mine.set_item("cart", "[1]").unwrap();
        assert_eq!(watcher.poll().unwrap(), 0);

        theirs.set_item("theme", "dark").unwrap();
        assert_eq!(watcher.poll().unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }
}
