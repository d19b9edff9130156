//! Click Drift save/load.
//!
//! The save is one keyed record: the JSON of `GameState` under the configured
//! key. Unknown fields are ignored and missing ones take their defaults, so
//! records written by older or newer builds still load. Catalog upgrades that
//! a record lacks are backfilled by `decode_state`.
//!
//! Upgrades are an ordered map, so encoding a decoded record reproduces it
//! byte for byte (apart from any backfilled upgrades).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::error::DriftError;
use super::state::GameState;

/// A durable key-value store.
pub trait SaveStore {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&mut self, key: &str, value: &str) -> Result<(), DriftError>;
    fn remove(&mut self, key: &str) -> Result<(), DriftError>;
}

pub fn encode_state(state: &GameState) -> Result<String, DriftError> {
    Ok(serde_json::to_string(state)?)
}

/// Parse a save record. `None` when the record is not a valid state; callers
/// fall back to a fresh game.
pub fn decode_state(json: &str) -> Option<GameState> {
    match serde_json::from_str::<GameState>(json) {
        Ok(mut state) => {
            state.backfill_upgrades();
            state.points = state.points.max(0.0);
            Some(state)
        }
        Err(e) => {
            crate::console::warn(&format!("save record unreadable, starting fresh: {e}"));
            None
        }
    }
}

/// In-memory store. Clones share the same records, so a test can keep one
/// handle while the engine owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_record(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .records
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<String> {
        self.records.borrow().get(key).cloned()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.records.borrow().get(key).cloned()
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), DriftError> {
        self.records
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DriftError> {
        self.records.borrow_mut().remove(key);
        Ok(())
    }
}

/// Browser localStorage.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// `None` when the window has no localStorage (e.g. disabled by the user).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok()?
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), DriftError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| DriftError::Storage(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), DriftError> {
        self.storage
            .remove_item(key)
            .map_err(|e| DriftError::Storage(format!("{e:?}")))
    }
}
