//! Cookie persistence - save and load the jar through a key-value store.
//!
//! The jar is stored as a JSON array under a single key.

use crate::base::neterror::NetError;
use crate::cookies::cookie::Cookie;
use crate::cookies::storage::CookieStorage;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key under which the jar is stored.
pub const COOKIE_KEY: &str = "cookies";

/// Minimal string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, NetError>;
    fn set(&self, key: &str, value: String) -> Result<(), NetError>;
}

/// In-memory store, mostly useful for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, NetError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), NetError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// A JSON object on disk. Each `set` rewrites the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load_map(&self) -> Result<HashMap<String, String>, NetError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| NetError::invalid_config(format!("{}: {e}", self.path.display())))?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| NetError::codec(e.to_string()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, NetError> {
        Ok(self.load_map()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<(), NetError> {
        let mut map = self.load_map()?;
        map.insert(key.to_string(), value);
        let json = serde_json::to_string_pretty(&map).map_err(|e| NetError::codec(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| NetError::invalid_config(format!("{}: {e}", self.path.display())))
    }
}

impl CookieStorage {
    /// Replace the in-memory set with whatever the store holds.
    ///
    /// Returns the number of cookies loaded. A missing key loads nothing
    /// and leaves the jar empty.
    pub fn load(&self, store: &dyn KeyValueStore) -> Result<usize, NetError> {
        let cookies: Vec<Cookie> = match store.get(COOKIE_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| NetError::codec(e.to_string()))?,
            None => Vec::new(),
        };
        let count = cookies.len();
        self.replace(cookies);
        tracing::debug!(count, "Loaded cookies");
        Ok(count)
    }

    /// Serialise the current set. Returns `Ok(false)` without touching the
    /// store when the jar is empty.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<bool, NetError> {
        let cookies = self.all();
        if cookies.is_empty() {
            return Ok(false);
        }
        let json = serde_json::to_string(&cookies).map_err(|e| NetError::codec(e.to_string()))?;
        store.set(COOKIE_KEY, json)?;
        tracing::debug!(count = cookies.len(), "Saved cookies");
        Ok(true)
    }
}
