//! Key-value persistence for todo state
//!
//! The task list lives as one JSON document under a well-known key. Keys map
//! to files inside a data directory, which plays the part of the storage
//! scope: two directories never see each other's keys.
//!
//! # Directory Structure
//!
//! ```text
//! <data-dir>/
//!   config.toml       # Optional configuration
//!   todos.json        # Task list document (key "todos")
//!   todos.lock        # Writer lock for the key
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Key under which the task list is stored unless configured otherwise
pub const DEFAULT_TASKS_KEY: &str = "todos";

/// A durable string store addressed by key.
///
/// Reading a missing key is not an error; it yields `None`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// File-backed store: one `<key>.json` file per key.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    lock_timeout_ms: u64,
    held: HashMap<String, FileLock>,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            held: HashMap::new(),
        }
    }

    /// Take the writer lock for `key` and hold it until this store is dropped.
    ///
    /// Call before reading a value that will be written back, so another
    /// process cannot write in between. Later `set`s on `key` reuse it.
    pub fn lock_key(&mut self, key: &str) -> Result<()> {
        if !self.held.contains_key(key) {
            let lock = FileLock::acquire(self.lock_path(key), self.lock_timeout_ms)?;
            debug!(key, "holding store lock");
            self.held.insert(key.to_string(), lock);
        }
        Ok(())
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Data directory backing this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document holding `key`
    pub fn value_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_key(key)))
    }

    /// Path of the writer lock for `key`
    pub fn lock_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.lock", file_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let _lock = if self.held.contains_key(key) {
            None
        } else {
            Some(FileLock::acquire(self.lock_path(key), self.lock_timeout_ms)?)
        };
        let path = self.value_path(key);
        lock::write_atomic(&path, value.as_bytes())?;
        debug!(path = %path.display(), bytes = value.len(), "stored value");
        Ok(())
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with `value` under `key`
    pub fn with_value(key: &str, value: impl Into<String>) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.into());
        store
    }

    /// Make every subsequent `set` fail, simulating an exhausted quota.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(crate::error::Error::OperationFailed(format!(
                "storage quota exceeded writing '{key}'"
            )));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn file_key(key: &str) -> String {
    let mut name = String::new();
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            name.push(ch);
        } else {
            name.push('_');
        }
    }
    if name.is_empty() {
        "_".to_string()
    } else {
        name
    }
}
