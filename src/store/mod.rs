//! Local state store access.
//!
//! The CRM syncs its working data into a directory of JSON documents, one
//! per key (the desktop analog of the web client's localStorage). This
//! module provides the read/write abstraction over that directory plus an
//! in-memory implementation for tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Errors raised by store access.
///
/// Read-side errors are swallowed by the scanners (an unreadable source
/// contributes zero notifications); write-side errors propagate out of the
/// mutation operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read key '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write key '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read/write access to the CRM's keyed JSON documents.
///
/// `get` returns `Ok(None)` for an absent key; only an actual I/O failure
/// is an error. `set` overwrites the whole document for the key.
pub trait StateStore: Send {
    /// Fetch the raw document for a key, if present.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the document for a key.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// List all keys starting with the given prefix, sorted.
    ///
    /// Used to discover user-scoped stores (`messages_<scope>` etc.)
    /// without configuring scopes up front.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// File-backed store: one `<key>.json` document per key in a flat directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store over the given directory, creating it if absent.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// The directory this store reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        debug!("writing store key '{}' ({} bytes)", key, value.len());
        fs::write(&path, value).map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();

        for entry in WalkDir::new(&self.dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem.starts_with(prefix) {
                    keys.push(stem.to_string());
                }
            }
        }

        keys.sort();
        keys
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key, bypassing the trait (test convenience).
    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }
}
