//! Write-through persistence of the node collection.
//!
//! The whole node list is stored as one JSON array under a single key. Loads
//! are best-effort: anything missing or unreadable comes back as an empty
//! collection. Saves are fire-and-forget; failures are only logged.

use crate::state::Node;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

pub const DEFAULT_STORAGE_KEY: &str = "ai-canvas-nodes";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage access failed: {0}")]
    Access(String),
    #[error("invalid node data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// String key-value backend (browser localStorage, or memory in tests).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
}

/// In-memory backend. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `window.localStorage`.
pub struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Result<web_sys::Storage, PersistError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(PersistError::Unavailable)
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| PersistError::Access(format!("{:?}", e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| PersistError::Access(format!("{:?}", e)))
    }
}

pub struct Persistence {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl Persistence {
    pub fn new(backend: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()), DEFAULT_STORAGE_KEY)
    }

    pub fn try_load(&self) -> Result<Vec<Node>, PersistError> {
        match self.backend.get(&self.key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Loads the stored collection, treating any failure as an empty canvas.
    pub fn load(&self) -> Vec<Node> {
        self.try_load().unwrap_or_else(|e| {
            log::warn!("discarding stored nodes under {:?}: {}", self.key, e);
            Vec::new()
        })
    }

    pub fn save(&self, nodes: &[Node]) {
        let result = serde_json::to_string(nodes)
            .map_err(PersistError::from)
            .and_then(|json| self.backend.set(&self.key, &json));
        if let Err(e) = result {
            log::warn!("failed to persist {} nodes: {}", nodes.len(), e);
        }
    }
}
