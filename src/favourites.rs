//! Favourite questions persisted in a small key-value store.
//!
//! The store is injected so tests can use [`MemoryStore`] while the CLI uses
//! [`FileStore`]. Favourites are read when loaded and written only on an
//! explicit toggle.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use parking_lot::Mutex;

use crate::error::{FeedError, Result};

/// Overrides the location of the default file store.
pub const STORE_PATH_ENV: &str = "CONSULT_FEED_STORE";

/// Storage key holding the JSON array of favourite question ids.
pub const FAVOURITES_KEY: &str = "favouriteQuestions";

/// Minimal string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the user's data directory, or at `CONSULT_FEED_STORE`.
    pub fn default_location() -> Result<Self> {
        if let Ok(path) = std::env::var(STORE_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(Self::new(path));
        }
        let dirs = ProjectDirs::from("org", "consult", "consult-feed").ok_or_else(|| {
            FeedError::Store("could not determine a data directory".to_string())
        })?;
        Ok(Self::new(dirs.data_dir().join("store.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            FeedError::Store(format!("corrupt store file {}: {e}", self.path.display()))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

/// Favourite question identifiers.
pub struct Favourites<'a> {
    store: &'a dyn KeyValueStore,
    ids: Vec<String>,
}

impl<'a> Favourites<'a> {
    /// Read the current favourites. A missing or unreadable entry is
    /// treated as empty.
    pub fn load(store: &'a dyn KeyValueStore) -> Result<Self> {
        let ids = match store.get(FAVOURITES_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("ignoring malformed {FAVOURITES_KEY} entry: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };
        Ok(Self { store, ids })
    }

    pub fn list(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Flip membership and persist. Returns whether `id` is now a favourite.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let now_favourite = if self.contains(id) {
            self.ids.retain(|existing| existing != id);
            false
        } else {
            self.ids.push(id.to_string());
            true
        };
        self.store
            .set(FAVOURITES_KEY, &serde_json::to_string(&self.ids)?)?;
        Ok(now_favourite)
    }
}
