//! Key-value settings stores.
//!
//! The session never touches storage directly; it is handed a
//! [`SettingsStore`] and writes through it on every change.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("unknown setting '{0}'")]
    UnknownKey(String),
}

/// Called with `(key, new_value)` after every successful write.
pub type Listener = Box<dyn FnMut(&str, &Value) + Send>;

pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;

    fn subscribe(&mut self, listener: Listener);
}

fn notify(listeners: &mut [Listener], key: &str, value: &Value) {
    for listener in listeners.iter_mut() {
        listener(key, value);
    }
}

/// In-memory store. Counts writes so callers can check write-through.
#[derive(Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
    listeners: Vec<Listener>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, e.g. to simulate a previous session.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("values", &self.values)
            .field("listeners", &self.listeners.len())
            .field("writes", &self.writes)
            .finish()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.clone());
        self.writes += 1;
        notify(&mut self.listeners, key, &value);
        Ok(())
    }

    fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }
}

/// One JSON object on disk, rewritten on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
    listeners: Vec<Listener>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing or corrupt file starts empty, so
    /// every key falls back to its default.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "settings file is corrupt, using defaults");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self {
            path,
            values,
            listeners: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .field("values", &self.values)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.clone());
        self.save()?;
        notify(&mut self.listeners, key, &value);
        Ok(())
    }

    fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }
}
