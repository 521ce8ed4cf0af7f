//! Key-value storage for session state.
//!
//! The filter engine only needs get/set-by-key with JSON values. Where those values end
//! up is decided by whoever owns the store: [`MemoryStore`] keeps them for the lifetime of
//! the process, [`JsonFileStore`] writes them to a single JSON document on disk.
use ahash::AHashMap;
use log::debug;
use serde_json::{Map, Value};
use std::{
    fs::{read_to_string, write},
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Name of the state file created inside the [config dir](crate::config_dir).
pub const STATE_FILE: &str = "state.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to access settings file: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    #[error("Settings file {path} is corrupted: {source}")]
    DecodeError {
        path: String,
        source: serde_json::Error,
    },

    #[error("Failed to encode settings: {source}")]
    EncodeError {
        #[from]
        source: serde_json::Error,
    },
}

/// Get/set-by-key storage of JSON-serializable values.
pub trait SettingsStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing the previous value.
    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// In-process store, lost when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: AHashMap<String, Value>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by one JSON object on disk. Every `set` rewrites the whole file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file doesn't exist yet.
    ///
    /// # Errors
    /// Fails if the file exists but can't be read or isn't a JSON object.
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        let values = if path.exists() {
            let raw = read_to_string(path)?;
            if raw.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str::<Map<String, Value>>(&raw).map_err(|source| {
                    SettingsError::DecodeError {
                        path: path.display().to_string(),
                        source,
                    }
                })?
            }
        } else {
            debug!("No state file at {}, starting fresh", path.display());
            Map::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Opens `state.json` inside the [config dir](crate::config_dir).
    ///
    /// # Errors
    /// Same as [`open`](Self::open), plus failures creating the config dir.
    pub fn open_default() -> Result<Self, SettingsError> {
        let dir = crate::config_dir()?;
        Self::open(&dir.join(STATE_FILE))
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        let encoded = serde_json::to_string_pretty(&self.values)?;
        write(&self.path, encoded)?;
        debug!("Saved key {key} to {}", self.path.display());
        Ok(())
    }
}
