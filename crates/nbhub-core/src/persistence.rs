use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Deserialize;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

use super::state::RootState;

/// Storage key holding the persisted slice of the state tree.
pub const PERSIST_KEY: &str = "persist:nbhub";
pub const PERSIST_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage path {0} has no parent directory")]
    NoParent(PathBuf),
}

/// Namespaced key/value store shared by the state store and the session.
pub trait StateStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
    fn clear(&self) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        Ok(())
    }
}

/// All keys live in one JSON object file that is rewritten atomically.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let parent = path
            .parent()
            .ok_or_else(|| PersistenceError::NoParent(path.clone()))?;
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        let body = serde_json::to_string_pretty(entries)?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            Some(_) => Path::new("."),
            None => return Err(PersistenceError::NoParent(self.path.clone())),
        };
        let io_err = |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };
        let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
        temp.write_all(body.as_bytes()).map_err(io_err)?;
        temp.flush().map_err(io_err)?;
        temp.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }

    fn update(
        &self,
        edit: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(PersistenceError::Corrupt { path, source }) => {
                warn!(path = %path.display(), error = %source, "discarding corrupt storage file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        edit(&mut entries);
        self.write_all(&entries)
    }
}

impl StateStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.update(BTreeMap::clear)
    }
}

/// Minimal identity carried across restarts. The token itself lives under
/// its own key, owned by the session context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuth {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub authenticated: bool,
}

impl PersistedAuth {
    pub fn from_state(state: &RootState) -> Self {
        Self {
            account_id: state.auth.account_id.clone(),
            username: state.auth.username.clone(),
            authenticated: state.auth.token_present,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSlice {
    pub version: u32,
    pub auth: PersistedAuth,
    #[serde(default)]
    pub saved_at_ms: i64,
}

impl PersistedSlice {
    pub fn new(auth: PersistedAuth) -> Self {
        Self {
            version: PERSIST_VERSION,
            auth,
            saved_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Reads the persisted slice.
///
/// An unreadable payload or a version from another deploy is removed so the
/// next boot starts clean; both cases return `Ok(None)`.
pub fn load_slice(storage: &dyn StateStorage) -> Result<Option<PersistedSlice>, PersistenceError> {
    let Some(raw) = storage.get(PERSIST_KEY)? else {
        return Ok(None);
    };

    match serde_json::from_str::<PersistedSlice>(&raw) {
        Ok(slice) if slice.version == PERSIST_VERSION => Ok(Some(slice)),
        Ok(slice) => {
            warn!(
                found = slice.version,
                expected = PERSIST_VERSION,
                "persisted state version mismatch, resetting"
            );
            storage.remove(PERSIST_KEY)?;
            Ok(None)
        }
        Err(err) => {
            warn!(error = %err, "persisted state unreadable, resetting");
            storage.remove(PERSIST_KEY)?;
            Ok(None)
        }
    }
}

pub fn save_slice(
    storage: &dyn StateStorage,
    slice: &PersistedSlice,
) -> Result<(), PersistenceError> {
    let raw = serde_json::to_string(slice)?;
    storage.set(PERSIST_KEY, &raw)
}
