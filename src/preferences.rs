//! Persisted key-value state that survives across page loads.
//!
//! The site stores exactly one value: the last successfully applied language
//! under [`LANGUAGE_KEY`].

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// Storage key for the language preference.
pub const LANGUAGE_KEY: &str = "app_lang";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to access preferences file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("preferences file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("preference store lock poisoned")]
    Poisoned,
}

/// Browser-local storage equivalent.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// In-memory store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let values = self.values.lock().map_err(|_| PreferenceError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().map_err(|_| PreferenceError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a flat JSON object on disk. A missing file reads as empty.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Map<String, Value>, PreferenceError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(PreferenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|source| PreferenceError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self
            .read_all()?
            .get(key)
            .and_then(Value::as_str)
            .map(String::from))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self.write_lock.lock().map_err(|_| PreferenceError::Poisoned)?;

        let mut values = self.read_all()?;
        values.insert(key.to_string(), Value::String(value.to_string()));

        let json = serde_json::to_string_pretty(&values).map_err(|source| {
            PreferenceError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, json).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_get_missing() {
        let store = MemoryPreferences::new();
        assert_eq!(store.get(LANGUAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_memory_set_overwrites() {
        let store = MemoryPreferences::with_value(LANGUAGE_KEY, "uk");
        store.set(LANGUAGE_KEY, "de").unwrap();
        assert_eq!(store.get(LANGUAGE_KEY).unwrap().as_deref(), Some("de"));
    }

    #[test]
    fn test_file_missing_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FilePreferences::new(dir.path().join("prefs.json"));
        assert_eq!(store.get(LANGUAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");

        FilePreferences::new(&path).set(LANGUAGE_KEY, "fr").unwrap();
        FilePreferences::new(&path).set("other", "x").unwrap();

        let reopened = FilePreferences::new(&path);
        assert_eq!(reopened.get(LANGUAGE_KEY).unwrap().as_deref(), Some("fr"));
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_file_corrupt_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FilePreferences::new(&path).get(LANGUAGE_KEY).unwrap_err();
        assert!(matches!(err, PreferenceError::Corrupt { .. }));
    }
}
