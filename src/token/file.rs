//! File Token Store Module
//!
//! Durable token slots persisted as a small JSON map on disk, so a session
//! survives process restarts but not an explicit logout.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::token::{Token, TokenStore};

// == Token File ==
/// The on-disk file shared by every slot.
///
/// Slots opened from the same `TokenFile` serialize their read-modify-write
/// cycles through one lock so concurrent writes to different keys never lose
/// each other.
#[derive(Debug)]
pub struct TokenFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the slot stored under `key`, loading its persisted value.
    pub fn slot(self: &Arc<Self>, key: &str) -> FileTokenStore {
        let initial = match self.load() {
            Ok(map) => map.get(key).cloned().map(Token::from),
            Err(e) => {
                warn!("Ignoring unreadable token file {}: {}", self.path.display(), e);
                None
            }
        };

        FileTokenStore {
            file: Arc::clone(self),
            key: key.to_string(),
            current: RwLock::new(initial),
        }
    }

    /// Reads the whole key map. A missing file is an empty map.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| ClientError::Storage(format!("corrupt token file: {}", e))),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }

    fn update(&self, key: &str, value: Option<&Token>) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // A corrupt file is replaced rather than blocking every future write.
        let mut map = self.load().unwrap_or_default();
        match value {
            Some(token) => {
                map.insert(key.to_string(), token.as_str().to_string());
            }
            None => {
                map.remove(key);
            }
        }

        let text = serde_json::to_string_pretty(&map)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text).map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| ClientError::Storage(e.to_string()))?;

        debug!("Persisted token slot '{}' to {}", key, self.path.display());
        Ok(())
    }
}

// == File Token Store ==
/// One durable token slot.
///
/// The in-memory copy is authoritative for the running process; the file
/// only has to catch up. Persistence failures are logged, never raised, so a
/// read-only disk degrades to a memory-only session.
#[derive(Debug)]
pub struct FileTokenStore {
    file: Arc<TokenFile>,
    key: String,
    current: RwLock<Option<Token>>,
}

impl FileTokenStore {
    /// Opens a standalone slot at `path`.
    pub fn open(path: impl Into<PathBuf>, key: &str) -> Self {
        TokenFile::new(path).slot(key)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<Token> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: Token) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        if let Err(e) = self.file.update(&self.key, Some(&token)) {
            warn!("Failed to persist token slot '{}': {}", self.key, e);
        }
    }

    fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(e) = self.file.update(&self.key, None) {
            warn!("Failed to clear token slot '{}': {}", self.key, e);
        }
    }
}
