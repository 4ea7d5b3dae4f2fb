//! Reward cooldown persistence
//!
//! The only state that outlives a session: when each reward kind was last
//! granted for a given context. The reward collaborator writes entries; the
//! simulation only reads them to gate requests and show remaining time.
//!
//! Persisted as JSON in LocalStorage on web, or a file on native.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Last-granted wall-clock timestamps keyed by `kind:context`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownStore {
    entries: BTreeMap<String, f64>,
}

impl CooldownStore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "adrenaline_assault_cooldowns";

    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build the storage key for a reward kind and context
    pub fn key(kind: &str, context: &str) -> String {
        format!("{kind}:{context}")
    }

    /// Record a grant at `now_ms`
    pub fn record(&mut self, key: &str, now_ms: f64) {
        self.entries.insert(key.to_string(), now_ms);
    }

    /// When the key was last granted
    pub fn last_granted(&self, key: &str) -> Option<f64> {
        self.entries.get(key).copied()
    }

    /// Milliseconds until the key may be granted again (0 when ready)
    pub fn remaining_ms(&self, key: &str, cooldown_ms: f64, now_ms: f64) -> f64 {
        match self.last_granted(key) {
            Some(last) => (cooldown_ms - (now_ms - last)).max(0.0),
            None => 0.0,
        }
    }

    /// Whether the cooldown for `key` has elapsed
    pub fn is_ready(&self, key: &str, cooldown_ms: f64, now_ms: f64) -> bool {
        self.remaining_ms(key, cooldown_ms, now_ms) <= 0.0
    }

    /// Number of recorded keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file; a missing file is an empty store
    pub fn load_from(path: &Path) -> Result<Self, PersistenceError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let store = Self::from_json(&json)?;
                log::info!("Loaded {} reward cooldowns", store.len());
                Ok(store)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a JSON file
    pub fn save_to(&self, path: &Path) -> Result<(), PersistenceError> {
        std::fs::write(path, self.to_json()?)?;
        log::debug!("Reward cooldowns saved ({} entries)", self.len());
        Ok(())
    }

    /// Load cooldowns from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(store) = Self::from_json(&json) {
                    log::info!("Loaded {} reward cooldowns", store.len());
                    return store;
                }
            }
        }

        log::info!("No reward cooldowns found, starting fresh");
        Self::new()
    }

    /// Save cooldowns to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), PersistenceError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistenceError::Unavailable("no LocalStorage".to_string()))?;
        let json = self.to_json()?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| PersistenceError::Unavailable("LocalStorage write refused".to_string()))?;
        log::debug!("Reward cooldowns saved ({} entries)", self.len());
        Ok(())
    }
}
