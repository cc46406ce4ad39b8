//! Persisted boolean settings.
//!
//! Settings live in a small JSON object on disk. Reads go to the file every
//! time so that a change made by another process (the tray shell) is picked up
//! on the next evaluation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use tracing::warn;

use crate::Result;
use crate::utils::fs;

/// Key/value store for boolean settings.
pub trait SettingsStore: Send + Sync {
    /// Current value, `None` if unset or unreadable.
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// Persist a value.
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
}

/// Settings backed by a JSON file.
pub struct JsonSettings {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        let Some(text) = fs::read_optional("reading settings", &self.path)? else {
            return Ok(Map::new());
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

impl SettingsStore for JsonSettings {
    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.read_map() {
            Ok(map) => map.get(key).and_then(Value::as_bool),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read settings");
                None
            }
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let _guard = self.write_lock.lock();
        // A corrupted file is replaced rather than blocking every future write.
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), Value::Bool(value));
        let text = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write_atomic("writing settings", &self.path, text.as_bytes())
    }
}

/// In-memory settings, used when nothing should touch the disk.
#[derive(Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, bool>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.read().get(key).copied()
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}
