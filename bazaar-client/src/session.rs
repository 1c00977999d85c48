//! Persisted session keys.
//!
//! Credentials live in a flat string key/value store under four fixed keys.
//! They are written together on login and removed together on logout or
//! session expiry.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use bazaar_core::{Role, SessionCredentials, UserRecord};
use tracing::warn;

use crate::error::StorageError;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";
pub const ROLE_KEY: &str = "role";

/// Every key owned by the session.
pub const SESSION_KEYS: [&str; 4] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY, ROLE_KEY];

/// Flat string storage, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Typed access to the session keys.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    /// Raw access for callers that keep their own keys next to the session.
    pub fn raw(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.non_empty(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.non_empty(REFRESH_TOKEN_KEY)
    }

    /// The stored user record. An unreadable record counts as absent.
    pub fn user(&self) -> Result<Option<UserRecord>, StorageError> {
        let Some(raw) = self.non_empty(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(error = %err, "stored user record is not valid JSON");
                Ok(None)
            }
        }
    }

    /// Role of the stored user: the user record first, then the role key.
    pub fn role(&self) -> Option<Role> {
        if let Ok(Some(user)) = self.user() {
            return Some(user.role);
        }
        match self.non_empty(ROLE_KEY) {
            Ok(Some(raw)) => raw.parse().ok(),
            _ => None,
        }
    }

    /// The full session, when every part of it is present.
    pub fn load(&self) -> Result<Option<SessionCredentials>, StorageError> {
        let (Some(access_token), Some(refresh_token), Some(user)) =
            (self.access_token()?, self.refresh_token()?, self.user()?)
        else {
            return Ok(None);
        };
        Ok(Some(SessionCredentials {
            access_token,
            refresh_token,
            user,
        }))
    }

    pub fn save(&self, session: &SessionCredentials) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.user)?;
        self.store.set(ACCESS_TOKEN_KEY, &session.access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, &session.refresh_token)?;
        self.store.set(USER_KEY, &user)?;
        self.store.set(ROLE_KEY, session.user.role.as_str())?;
        Ok(())
    }

    /// Replace the access token, and the refresh token when the server rotated it.
    pub fn update_tokens(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, access_token)?;
        if let Some(refresh_token) = refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh_token)?;
        }
        Ok(())
    }

    /// Remove every session key. Keeps going past a failing key and reports
    /// the first error.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut first_err = None;
        for key in SESSION_KEYS {
            if let Err(err) = self.store.remove(key) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn non_empty(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(key)?.filter(|v| !v.is_empty()))
    }
}
