/// Storage
///
/// Host key-value store abstraction. The protocol engine writes the session
/// through `RemoteStorage`; the controller only ever clears it.
///
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::constants::{KEY_CONNECTION, KEY_LAST_EVENT_ID, STORAGE_PREFIX};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn has(&self, key: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.remove(key);
        }
    }

    fn has(&self, key: &str) -> bool {
        self.items
            .lock()
            .map(|items| items.contains_key(key))
            .unwrap_or(false)
    }
}

/// Prefix-namespaced view over a host store.
#[derive(Clone)]
pub struct RemoteStorage {
    prefix: String,
    store: Arc<dyn KeyValueStore>,
}

impl RemoteStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_prefix(STORAGE_PREFIX, store)
    }

    pub fn with_prefix(prefix: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            prefix: prefix.to_string(),
            store,
        }
    }

    pub fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.store.get(&self.storage_key(key))
    }

    pub fn set_item(&self, key: &str, value: &str) {
        self.store.set(&self.storage_key(key), value);
    }

    pub fn remove_item(&self, key: &str) {
        self.store.remove(&self.storage_key(key));
    }

    pub fn has_item(&self, key: &str) -> bool {
        self.store.has(&self.storage_key(key))
    }

    /// Drops the persisted connection and last event id.
    pub fn clear_session(&self) {
        self.remove_item(KEY_CONNECTION);
        self.remove_item(KEY_LAST_EVENT_ID);
    }
}
