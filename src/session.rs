//! Session-scoped key/value store backing the wizard.
//!
//! The wizard keeps its cross-step state (active domain, cached
//! verification challenge, created admin credentials) in a `SessionStore`
//! handed to it explicitly. Storage itself is pluggable through the
//! `SessionBackend` trait; values are JSON-encoded and keys carry an
//! application namespace so unrelated session data cannot collide.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Namespace prefix applied to every key.
const KEY_PREFIX: &str = "onboarder#";

/// Well-known session keys used by the wizard.
pub mod keys {
    pub const CURRENT_DOMAIN: &str = "CurrentDomain";
    pub const VERIFICATION_CHALLENGE: &str = "SiteVerificationTokenCache";
    pub const ADMIN_ACCOUNT: &str = "AdminAccount";
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session backend failure: {0}")]
    Backend(String),
    #[error("failed to encode session value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode session value for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw string storage underneath the session store.
///
/// Implementations are synchronous: the wizard runs on a single logical
/// thread of control and never holds a backend lock across an await point.
pub trait SessionBackend: Send + Sync {
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;
}

/// In-memory backend; state lives exactly as long as the session object.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemoryBackend {
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut items = self
            .items
            .lock()
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        let items = self
            .items
            .lock()
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        Ok(items.get(key).cloned())
    }
}

/// File backend: one JSON document on disk, rewritten on every set.
///
/// Useful for resuming a half-finished run from the CLI; the wizard itself
/// does not care which backend it is given.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    items: Mutex<HashMap<String, String>>,
}

impl FileBackend {
    /// Open (or create) the backing file and load any existing items.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| SessionError::Backend(e.to_string()))?;
            serde_json::from_str(&contents).map_err(|e| SessionError::Backend(e.to_string()))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    fn persist(&self, items: &HashMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Backend(e.to_string()))?;
        }
        let contents = serde_json::to_string_pretty(items)
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        std::fs::write(&self.path, contents).map_err(|e| SessionError::Backend(e.to_string()))
    }
}

impl SessionBackend for FileBackend {
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut items = self
            .items
            .lock()
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        items.insert(key.to_string(), value.to_string());
        self.persist(&items)
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        let items = self
            .items
            .lock()
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        Ok(items.get(key).cloned())
    }
}

/// Typed, namespaced view over a `SessionBackend`.
pub struct SessionStore {
    backend: Box<dyn SessionBackend>,
}

impl SessionStore {
    pub fn new(backend: Box<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    /// Convenience constructor for the common in-memory case.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    fn namespaced(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    /// Store a JSON-serializable value. Overwrites any previous value.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(value).map_err(|source| SessionError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.backend.set_item(&Self::namespaced(key), &encoded)
    }

    /// Fetch the last stored value for `key`, or `None` if absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        match self.backend.get_item(&Self::namespaced(key))? {
            Some(raw) => {
                let value =
                    serde_json::from_str(&raw).map_err(|source| SessionError::Decode {
                        key: key.to_string(),
                        source,
                    })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
