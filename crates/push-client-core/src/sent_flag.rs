//! Durable "token sent to server" flag.
//!
//! The flag is stored as `"1"` / `"0"` under a single key. Anything else,
//! including a missing key, reads as false.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const SENT: &str = "1";
const NOT_SENT: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read {key}: {detail}")]
    Read { key: String, detail: String },
    #[error("failed to write {key}: {detail}")]
    Write { key: String, detail: String },
}

/// String key-value storage scoped to one client profile.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process store, for native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone)]
pub struct SentFlag {
    store: Rc<dyn KeyValueStore>,
    key: String,
}

impl SentFlag {
    pub fn new(store: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn is_sent(&self) -> bool {
        match self.store.get_item(&self.key) {
            Ok(value) => value.as_deref() == Some(SENT),
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "sent flag unreadable; treating as not sent");
                false
            }
        }
    }

    pub fn set_sent(&self, sent: bool) {
        let value = if sent { SENT } else { NOT_SENT };
        if let Err(error) = self.store.set_item(&self.key, value) {
            tracing::warn!(key = %self.key, sent, %error, "failed to persist sent flag");
        }
    }
}

impl std::fmt::Debug for SentFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentFlag").field("key", &self.key).finish()
    }
}
