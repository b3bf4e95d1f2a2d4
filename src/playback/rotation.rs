//! Advertisement rotation persisted across restarts.

use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt rotation index: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable storage for the last played advertisement index
pub trait IndexStore {
    fn read(&self) -> Result<Option<usize>, StoreError>;
    fn write(&self, index: usize) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredIndex {
    #[serde(rename = "current-ad-index")]
    current_ad_index: usize,
}

/// JSON file holding `{"current-ad-index": n}`
pub struct FileIndexStore {
    path: PathBuf,
}

impl FileIndexStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl IndexStore for FileIndexStore {
    fn read(&self) -> Result<Option<usize>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let stored: StoredIndex = serde_json::from_str(&text)?;
        Ok(Some(stored.current_ad_index))
    }

    fn write(&self, index: usize) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string(&StoredIndex {
            current_ad_index: index,
        })?;
        fs::write(&self.path, text).map_err(io_err)
    }
}

/// Volatile store, used when the data directory is unusable
#[derive(Clone, Default)]
pub struct MemoryIndexStore(Rc<Cell<Option<usize>>>);

impl IndexStore for MemoryIndexStore {
    fn read(&self) -> Result<Option<usize>, StoreError> {
        Ok(self.0.get())
    }

    fn write(&self, index: usize) -> Result<(), StoreError> {
        self.0.set(Some(index));
        Ok(())
    }
}

/// Which advertisement plays next, wrapping modulo the advertisement count
pub struct AdRotation {
    store: Box<dyn IndexStore>,
    index: usize,
    count: usize,
}

impl AdRotation {
    /// Restore the last index from `store`; unreadable values start at 0.
    pub fn new(store: Box<dyn IndexStore>) -> Self {
        let index = match store.read() {
            Ok(index) => index.unwrap_or(0),
            Err(e) => {
                log::warn!("Ignoring stored advertisement index: {}", e);
                0
            }
        };
        log::info!("Starting rotation at advertisement index {}", index);
        Self {
            store,
            index,
            count: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_count(&mut self, count: usize) {
        self.count = count;
    }

    /// Step to the next advertisement and persist it. No-op without advertisements.
    pub fn advance(&mut self) -> usize {
        if self.count == 0 {
            return self.index;
        }
        // Stored values are user-editable, so reduce before stepping
        self.index = (self.index % self.count + 1) % self.count;
        if let Err(e) = self.store.write(self.index) {
            log::warn!("Failed to persist advertisement index: {}", e);
        }
        self.index
    }
}
