// The shopping cart: in-memory lines mirrored to local storage
use serde_json::Value;
use std::sync::Arc;
use storefront_storage::{KeyValueStore, StorageEvent};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::models::{CartLine, Product};
use crate::notify::Notification;

/// Storage key holding the JSON array of cart lines
pub const CART_STORAGE_KEY: &str = "cart";

const NOTIFICATION_CAPACITY: usize = 32;
const REQUIRED_FIELDS: [&str; 4] = ["id", "title", "price", "quantity"];

/// Why a persisted cart was thrown away
#[derive(Error, Debug)]
pub enum CartValidationError {
    #[error("not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON array")]
    NotAnArray,

    #[error("line {index} is not an object")]
    NotAnObject { index: usize },

    #[error("line {index} is missing '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("line {index} has a non-numeric quantity")]
    QuantityNotNumeric { index: usize },

    #[error("line {index} is malformed: {source}")]
    InvalidLine {
        index: usize,
        source: serde_json::Error,
    },
}

/// Validate and decode a persisted cart
///
/// Every element must carry `id`, `title`, `price` and a numeric
/// `quantity`. Lines at quantity 0 are dropped and repeated ids are folded
/// into one line so the one-line-per-product rule holds after loading.
pub fn parse_cart(raw: &str) -> Result<Vec<CartLine>, CartValidationError> {
    let value: Value = serde_json::from_str(raw)?;
    let items = value.as_array().ok_or(CartValidationError::NotAnArray)?;

    let mut lines: Vec<CartLine> = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let object = item
            .as_object()
            .ok_or(CartValidationError::NotAnObject { index })?;

        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(CartValidationError::MissingField { index, field });
            }
        }
        if !object["quantity"].is_number() {
            return Err(CartValidationError::QuantityNotNumeric { index });
        }

        let line: CartLine = serde_json::from_value(item.clone())
            .map_err(|source| CartValidationError::InvalidLine { index, source })?;

        if line.quantity == 0 {
            continue;
        }
        match lines.iter_mut().find(|l| l.id() == line.id()) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => lines.push(line),
        }
    }

    Ok(lines)
}

/// Cart lines plus the operations that change them
///
/// Every mutation is written through to storage straight away. An empty
/// cart is never persisted: the storage key exists exactly when the cart
/// has lines. Other views learn about changes through storage events and
/// call [`CartStore::sync_from_storage`].
pub struct CartStore {
    storage: Arc<dyn KeyValueStore>,
    lines: Vec<CartLine>,
    snapshot_tx: watch::Sender<Vec<CartLine>>,
    notify_tx: broadcast::Sender<Notification>,
}

impl CartStore {
    /// Read the persisted cart, starting empty if it is missing or corrupt
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        let (notify_tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let mut store = Self {
            storage,
            lines: Vec::new(),
            snapshot_tx,
            notify_tx,
        };
        store.lines = store.read_persisted();
        store.snapshot_tx.send_replace(store.lines.clone());
        debug!("Cart loaded with {} line(s)", store.lines.len());
        store
    }

    fn read_persisted(&self) -> Vec<CartLine> {
        let raw = match self.storage.get_item(CART_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Cart load error: {}", e);
                return Vec::new();
            }
        };

        match parse_cart(&raw) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Discarding corrupt persisted cart: {}", e);
                if let Err(e) = self.storage.remove_item(CART_STORAGE_KEY) {
                    warn!("Failed to clear corrupt cart: {}", e);
                }
                Vec::new()
            }
        }
    }

    /// Write the current lines through to storage, or drop the key if empty
    fn persist(&self) {
        let result = if self.lines.is_empty() {
            self.storage.remove_item(CART_STORAGE_KEY).map_err(|e| e.to_string())
        } else {
            serde_json::to_string(&self.lines)
                .map_err(|e| e.to_string())
                .and_then(|json| {
                    self.storage
                        .set_item(CART_STORAGE_KEY, &json)
                        .map_err(|e| e.to_string())
                })
        };

        if let Err(e) = result {
            warn!("Cart save error: {}", e);
        }
    }

    fn commit(&mut self, notification: Option<Notification>) {
        self.persist();
        self.snapshot_tx.send_replace(self.lines.clone());
        if let Some(notification) = notification {
            info!("{}", notification);
            // Nobody listening is fine
            let _ = self.notify_tx.send(notification);
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn get(&self, id: u64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Units across all lines
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Delivery is free, always
    pub fn delivery_fee(&self) -> f64 {
        0.0
    }

    /// Latest cart snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartLine>> {
        self.snapshot_tx.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    /// Put one more of `product` in the cart
    pub fn add(&mut self, product: &Product) -> &[CartLine] {
        let notification = match self.lines.iter_mut().find(|l| l.id() == product.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                Notification::QuantityUpdated {
                    product_id: product.id,
                }
            }
            None => {
                self.lines.push(CartLine::new(product.clone()));
                Notification::added(&product.title)
            }
        };

        self.commit(Some(notification));
        &self.lines
    }

    pub fn increase(&mut self, id: u64) -> &[CartLine] {
        let notification = self.lines.iter_mut().find(|l| l.id() == id).map(|line| {
            line.quantity = line.quantity.saturating_add(1);
            Notification::QuantityIncreased {
                title: line.title().to_string(),
            }
        });

        if notification.is_some() {
            self.commit(notification);
        }
        &self.lines
    }

    /// Take one away. A line at quantity 1 stays put; use `remove` for that.
    pub fn decrease(&mut self, id: u64) -> &[CartLine] {
        let notification = self
            .lines
            .iter_mut()
            .find(|l| l.id() == id && l.quantity > 1)
            .map(|line| {
                line.quantity -= 1;
                Notification::QuantityDecreased {
                    title: line.title().to_string(),
                }
            });
        self.lines.retain(|l| l.quantity > 0);

        if notification.is_some() {
            self.commit(notification);
        }
        &self.lines
    }

    pub fn remove(&mut self, id: u64) -> &[CartLine] {
        self.lines.retain(|l| l.id() != id);
        self.commit(Some(Notification::Removed));
        &self.lines
    }

    /// Check out: forget every line and the persisted entry
    pub fn complete_order(&mut self) {
        self.lines.clear();
        self.commit(Some(Notification::OrderCompleted));
    }

    /// Re-read storage after another view changed it
    ///
    /// Only ever writes to drop a corrupt value; valid lines are never written
    /// back, so two views cannot ping-pong updates.
    pub fn sync_from_storage(&mut self) {
        self.lines = self.read_persisted();
        self.snapshot_tx.send_replace(self.lines.clone());
        debug!("Cart synced from storage: {} line(s)", self.lines.len());
    }

    /// React to a storage event. Returns whether it concerned the cart.
    pub fn apply_storage_event(&mut self, event: &StorageEvent) -> bool {
        if event.key != CART_STORAGE_KEY {
            return false;
        }
        self.sync_from_storage();
        true
    }
}
