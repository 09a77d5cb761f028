//! # Local Storage
//!
//! Where the cart lives between sessions.
//!
//! ## Persisted Form
//! ```text
//! key:   "@RocketShoes:cart"
//! value: [{"id":1,"title":"Tênis ...","price":179.9,"image":"https://...","amount":2}]
//! ```
//!
//! The whole cart is written as one value after every successful mutation
//! and read exactly once, when the store starts.

use rocketshoes_core::Cart;
use rocketshoes_db::Database;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, warn};

use crate::error::{CartResult, StorageResult};

/// String key/value store with `localStorage` semantics.
///
/// `set_item` must replace the previous value atomically: after a failed
/// write the old value is still there, never a truncated one.
pub trait LocalStore: Send + Sync {
    /// Returns the value under `key`, or `None` if it was never written.
    fn get_item(&self, key: &str) -> impl Future<Output = StorageResult<Option<String>>> + Send;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = StorageResult<()>> + Send;
}

/// SQLite-backed store, the one the app uses.
impl LocalStore for Database {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.local_storage().get_item(key).await?)
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        Ok(self.local_storage().set_item(key, value).await?)
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Process-local store.
///
/// Clones share the same map, so a test can keep a handle and inspect
/// what the cart store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `value` under `key`.
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.insert(key.into(), value.into());
        store
    }

    /// Synchronous read, for inspection.
    pub fn get(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn insert(&self, key: String, value: String) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }
}

impl LocalStore for MemoryStore {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.get(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Cart Codec
// =============================================================================

/// Reads the persisted cart.
///
/// Never fails: a missing key is an empty cart, and so is a value that
/// does not decode (corrupt JSON, duplicate ids, zero amounts) or a store
/// that cannot be read. The latter two are logged.
pub async fn load_cart<L: LocalStore>(store: &L, key: &str) -> Cart {
    match store.get_item(key).await {
        Ok(None) => {
            debug!(key, "No persisted cart");
            Cart::new()
        }
        Ok(Some(raw)) => match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => cart,
            Err(err) => {
                warn!(key, error = %err, "Persisted cart is unreadable, starting with an empty cart");
                Cart::new()
            }
        },
        Err(err) => {
            error!(key, error = %err, "Could not read persisted cart, starting with an empty cart");
            Cart::new()
        }
    }
}

/// Writes the whole cart under `key`.
pub async fn save_cart<L: LocalStore>(store: &L, key: &str, cart: &Cart) -> CartResult<()> {
    let json = serde_json::to_string(cart)?;
    store.set_item(key, &json).await?;

    debug!(key, items = cart.item_count(), "Cart persisted");
    Ok(())
}
