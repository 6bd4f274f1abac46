use super::*;

use push_client_core::{KeyValueStore, StoreError};
use web_sys::Storage;

/// `window.localStorage`, scoped to the page origin.
pub(super) struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub(super) fn from_window() -> Result<Self, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("window is unavailable".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|_| StoreError::Unavailable("local storage access was denied".to_string()))?
            .ok_or_else(|| StoreError::Unavailable("local storage is disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(|error| StoreError::Read {
            key: key.to_string(),
            detail: bindings::js_error_text(&error),
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(|error| StoreError::Write {
            key: key.to_string(),
            detail: bindings::js_error_text(&error),
        })
    }
}
