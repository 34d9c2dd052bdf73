//! Cross-year hand-off of the end-of-year reserve.
//!
//! A budget page publishes its projected closing reserve into a named slot;
//! the following year's page reads it back as its starting reserve. A
//! missing, unparsable or zero value means "not available"
//! and the reader recomputes from the plan instead.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{CoreError, CoreResult};
use crate::metrics;

/// Hand-off store reference type
pub type HandoffRef = Arc<dyn HandoffStore>;

/// String key/value slots shared between budget pages
pub trait HandoffStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    fn remove(&self, key: &str) -> CoreResult<()>;
}

fn poisoned() -> CoreError {
    CoreError::InternalError {
        message: "hand-off store lock poisoned".to_string(),
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryHandoffStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryHandoffStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HandoffStore for MemoryHandoffStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.slots
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.slots.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }
}

/// Slots kept in a small JSON object on disk, rewritten on every change.
///
/// The slot lock is released before the file is written; readers never wait
/// on disk I/O. Writers queue on `disk` so files land in update order.
#[derive(Debug)]
pub struct FileHandoffStore {
    path: PathBuf,
    slots: RwLock<BTreeMap<String, String>>,
    disk: Mutex<()>,
}

impl FileHandoffStore {
    /// Open the store; a missing or unreadable file starts empty
    pub fn open(path: PathBuf) -> Self {
        let slots = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed hand-off file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            slots: RwLock::new(slots),
            disk: Mutex::new(()),
        }
    }

    /// Apply `change` to the slots and rewrite the file when it reports a change
    fn update<F>(&self, change: F) -> CoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _disk = self.disk.lock().map_err(|_| poisoned())?;
        let content = {
            let mut slots = self.slots.write().map_err(|_| poisoned())?;
            if !change(&mut slots) {
                return Ok(());
            }
            serde_json::to_string_pretty(&*slots).map_err(|e| CoreError::InternalError {
                message: e.to_string(),
            })?
        };
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl HandoffStore for FileHandoffStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.update(|slots| {
            slots.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.update(|slots| slots.remove(key).is_some())
    }
}

/// Read a reserve value from a slot; `None` when absent, unparsable, zero or out of range
pub fn read_reserve(store: &dyn HandoffStore, key: &str) -> Option<Decimal> {
    let raw = store.get(key)?;
    match Decimal::from_str(raw.trim()).or_else(|_| Decimal::from_scientific(raw.trim())) {
        Ok(value) if value.is_zero() => {
            log::debug!("Hand-off slot {} holds zero, treating as absent", key);
            None
        }
        Ok(value) if value.abs() > metrics::MAX_AMOUNT => {
            log::warn!("Hand-off slot {} holds out-of-range value {}", key, value);
            None
        }
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Hand-off slot {} holds unparsable value '{}'", key, raw);
            None
        }
    }
}

pub fn write_reserve(store: &dyn HandoffStore, key: &str, value: Decimal) -> CoreResult<()> {
    store.set(key, &value.to_string())?;
    log::debug!("Hand-off slot {} <- {}", key, value);
    Ok(())
}
