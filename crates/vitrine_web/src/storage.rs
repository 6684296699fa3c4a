//! `localStorage` flag store

use wasm_bindgen::JsValue;
use web_sys::{Storage, Window};

use vitrine_core::{FlagStore, Result, VitrineError};

use crate::describe;

/// [`FlagStore`] backed by `window.localStorage`
///
/// Browsers can deny storage outright (some private modes, sandboxed
/// frames). In that case every read and write fails with
/// [`VitrineError::StorageUnavailable`] and the announcement gate degrades.
#[derive(Clone, Debug)]
pub struct LocalStorageFlags {
    storage: Option<Storage>,
}

impl LocalStorageFlags {
    /// Open the window's local storage
    pub fn new(window: &Window) -> Self {
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(err) => {
                tracing::warn!("LocalStorageFlags::new - localStorage denied: {}", describe(&err));
                None
            }
        };
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| VitrineError::StorageUnavailable("localStorage is not available".into()))
    }
}

fn unavailable(err: JsValue) -> VitrineError {
    VitrineError::StorageUnavailable(describe(&err))
}

impl FlagStore for LocalStorageFlags {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage()?.get_item(key).map_err(unavailable)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage()?.set_item(key, value).map_err(unavailable)
    }
}
