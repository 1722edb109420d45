//! Settings storage collaborators.
//!
//! [`SettingsStorage`] is a small key/value contract over JSON values. The
//! scheme manager uses two keys (see [`crate::settings`]) and makes no
//! transactional assumptions across them.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStorage`]: in-process map; clones share the same contents
//! - [`JsonFileStorage`]: a single JSON object document on disk

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Value};

use crate::error::{Result, SchemeError};

/// Key/value storage for persisted settings.
pub trait SettingsStorage: Send + Sync {
    /// Reads a value, `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes a value, replacing any previous one.
    fn store(&self, key: &str, value: Value) -> Result<()>;

    /// Removes a value. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory storage.
///
/// ```rust
/// use hueswitch::storage::{MemoryStorage, SettingsStorage};
///
/// let storage = MemoryStorage::new().with_value("color-scheme", "dark");
/// let view = storage.clone();
/// storage.delete("color-scheme").unwrap();
/// assert_eq!(view.get("color-scheme").unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a value, returning `self` for chaining.
    pub fn with_value(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        self
    }

    /// Returns a copy of all stored values.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SettingsStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn store(&self, key: &str, value: Value) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object file.
///
/// Every operation reads the file, so external edits are picked up. A
/// missing file reads as empty and is created on the first write.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(SchemeError::Storage(format!(
                "{} does not contain a JSON object (found {})",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn write(&self, map: Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read()?.remove(key))
    }

    fn store(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read()?;
        map.insert(key.to_string(), value);
        self.write(map)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut map = self.read()?;
        if map.remove(key).is_some() {
            self.write(map)?;
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
