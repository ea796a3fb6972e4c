//! Tab-scoped key/value persistence for session progress.
//!
//! Values are plain strings, mirroring what a browser session store would hold.
//! Two implementations:
//!   - `MemoryStore`: shared in-memory map (tests, or persistence switched off)
//!   - `FileStore`: one JSON file per tab id, rewritten on every change

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const UNLOCKED_KEY: &str = "quizUnlocked";
pub const INDEX_KEY: &str = "quizIndex";
pub const TEAM_KEY: &str = "teamNo";

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("session store I/O failed: {0}")]
  Io(#[from] std::io::Error),
  #[error("session store file is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),
}

/// Injected persistence port. Reads never fail; a missing key is `None`.
pub trait SessionStore: Send {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
  fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Cloning shares the underlying map, so a test can keep a handle while the session owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
  map: Arc<DashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SessionStore for MemoryStore {
  fn get(&self, key: &str) -> Option<String> {
    self.map.get(key).map(|v| v.value().clone())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    self.map.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StoreError> {
    self.map.remove(key);
    Ok(())
  }
}

/// `<dir>/<tab_id>.json`. The whole map is cached in memory and flushed after each write.
#[derive(Debug)]
pub struct FileStore {
  path: PathBuf,
  values: BTreeMap<String, String>,
}

impl FileStore {
  /// Open (or lazily create) the store for `tab_id`. A missing file is an empty store.
  #[instrument(level = "debug", skip(dir), fields(dir = %dir.as_ref().display()))]
  pub fn open(dir: impl AsRef<Path>, tab_id: &str) -> Result<Self, StoreError> {
    let path = dir.as_ref().join(format!("{tab_id}.json"));
    let values = match std::fs::read_to_string(&path) {
      Ok(s) => serde_json::from_str(&s)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => return Err(e.into()),
    };
    debug!(target: "quizgate", path = %path.display(), keys = values.len(), "Opened session store");
    Ok(Self { path, values })
  }

  fn flush(&self) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(&self.values)?;
    std::fs::write(&self.path, body)?;
    Ok(())
  }
}

impl SessionStore for FileStore {
  fn get(&self, key: &str) -> Option<String> {
    self.values.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    self.values.insert(key.to_string(), value.to_string());
    self.flush()
  }

  fn remove(&mut self, key: &str) -> Result<(), StoreError> {
    if self.values.remove(key).is_some() {
      self.flush()?;
    }
    Ok(())
  }
}

/// Where a tab's session lives. `open` is called again on every reload.
#[derive(Clone, Debug)]
pub enum StoreLocation {
  File { dir: PathBuf, tab_id: String },
  Memory(MemoryStore),
}

impl StoreLocation {
  pub fn new(dir: Option<PathBuf>, tab_id: &str) -> Self {
    match dir {
      Some(dir) => StoreLocation::File { dir, tab_id: tab_id.to_string() },
      None => StoreLocation::Memory(MemoryStore::new()),
    }
  }

  /// An unreadable file falls back to an empty in-memory store; the quiz still runs.
  pub fn open(&self) -> Box<dyn SessionStore> {
    match self {
      StoreLocation::File { dir, tab_id } => match FileStore::open(dir, tab_id) {
        Ok(store) => Box::new(store),
        Err(e) => {
          warn!(target: "quizgate", dir = %dir.display(), %tab_id, error = %e, "Session store unavailable; progress will not persist");
          Box::new(MemoryStore::new())
        }
      },
      StoreLocation::Memory(store) => Box::new(store.clone()),
    }
  }
}
