use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{DashboardError, DashboardResult};

/// A host-scoped key/value surface. `update(key, None)` removes the key, so
/// a later `get` distinguishes "never written" from "written empty".
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> DashboardResult<Option<Value>>;
    fn update(&self, key: &str, value: Option<Value>) -> DashboardResult<()>;
}

/// A whole JSON object persisted in one file, rewritten on every update.
/// Updates are serialized per instance and land through a rename, so readers
/// never observe a partially written document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    label: &'static str,
    update_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, label: &'static str) -> Self {
        Self {
            path: path.into(),
            label,
            update_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_updates(&self) -> MutexGuard<'_, ()> {
        self.update_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        self.path
            .with_file_name(format!(".{file_name}.{}.tmp", std::process::id()))
    }

    fn read_document(&self) -> DashboardResult<Map<String, Value>> {
        if !self.path.is_file() {
            return Ok(Map::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|error| {
            DashboardError::storage(format!("Failed to read {} file: {error}", self.label))
        })?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        let parsed = serde_json::from_str::<Value>(&raw).map_err(|error| {
            DashboardError::storage(format!("Failed to parse {} file: {error}", self.label))
        })?;
        match parsed {
            Value::Object(document) => Ok(document),
            _ => Err(DashboardError::storage(format!(
                "{} file {} must contain a JSON object.",
                self.label,
                self.path.display()
            ))),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> DashboardResult<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| {
                DashboardError::storage(format!(
                    "Failed to create {} directory: {error}",
                    self.label
                ))
            })?;
        }

        let body = serde_json::to_string_pretty(document).map_err(|error| {
            DashboardError::storage(format!("Failed to serialize {} file: {error}", self.label))
        })?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, format!("{body}\n")).map_err(|error| {
            DashboardError::storage(format!("Failed to write {} file: {error}", self.label))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|error| {
            let _ = fs::remove_file(&temp_path);
            DashboardError::storage(format!("Failed to replace {} file: {error}", self.label))
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> DashboardResult<Option<Value>> {
        let mut document = self.read_document()?;
        Ok(document.remove(key))
    }

    fn update(&self, key: &str, value: Option<Value>) -> DashboardResult<()> {
        let _guard = self.lock_updates();
        let mut document = self.read_document()?;
        match value {
            Some(value) => {
                document.insert(key.to_string(), value);
            }
            None => {
                document.remove(key);
            }
        }
        self.write_document(&document)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(key, value)| (key.into(), value))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DashboardResult<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|error| DashboardError::storage(format!("Failed to lock memory store: {error}")))?;
        Ok(values.get(key).cloned())
    }

    fn update(&self, key: &str, value: Option<Value>) -> DashboardResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|error| DashboardError::storage(format!("Failed to lock memory store: {error}")))?;
        match value {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => {
                values.remove(key);
            }
        }
        Ok(())
    }
}
