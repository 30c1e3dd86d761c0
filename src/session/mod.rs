//! Session state shared by the API client: the bearer token and the cached
//! identity of the signed-in admin.
//!
//! Storage is pluggable through [`SessionStore`]. The client only talks to a
//! [`SessionContext`], which knows the key layout and the expiry latch.

pub mod file;
pub mod memory;

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use thiserror::Error;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// Preferred key for the admin bearer token
pub const ADMIN_TOKEN_KEY: &str = "adminToken";
/// Legacy generic token key, read when the admin key is absent
pub const LEGACY_TOKEN_KEY: &str = "token";
/// Cached user-identity object (JSON)
pub const USER_KEY: &str = "user";

/// Token keys in lookup order
pub const TOKEN_KEYS: [&str; 2] = [ADMIN_TOKEN_KEY, LEGACY_TOKEN_KEY];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session storage lock poisoned")]
    Poisoned,
}

/// Persistent string key-value storage for session state
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    fn remove(&self, key: &str) -> Result<(), SessionError>;

    /// Remove several keys as one step. Stores that guard their state with a
    /// lock override this so readers never see a partially cleared session.
    fn remove_all(&self, keys: &[&str]) -> Result<(), SessionError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Which session the last teardown notified about
#[derive(Debug, Default)]
struct ExpiryLatch {
    notified: bool,
    /// Token that was in storage when the session was last torn down
    torn_down: Option<String>,
}

/// Explicit session handle injected into the API client
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    latch: Arc<Mutex<ExpiryLatch>>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            latch: Arc::new(Mutex::new(ExpiryLatch::default())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Current bearer token exactly as stored; the admin key wins when both
    /// are present and blank values count as absent
    pub fn token(&self) -> Option<String> {
        TOKEN_KEYS.iter().find_map(|key| {
            self.store
                .get(key)
                .filter(|value| !value.trim().is_empty())
        })
    }

    /// Which key the current token was read from
    pub fn token_key(&self) -> Option<&'static str> {
        TOKEN_KEYS.iter().copied().find(|key| {
            self.store
                .get(key)
                .map_or(false, |value| !value.trim().is_empty())
        })
    }

    /// Store a freshly issued token and re-arm session expiry notification
    pub fn set_token(&self, token: &str) -> Result<(), SessionError> {
        self.store.set(ADMIN_TOKEN_KEY, token)?;
        self.latch().notified = false;
        Ok(())
    }

    pub fn user(&self) -> Option<Value> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached user: {}", e);
                None
            }
        }
    }

    pub fn set_user(&self, user: &Value) -> Result<(), SessionError> {
        let raw = serde_json::to_string(user)?;
        self.store.set(USER_KEY, &raw)
    }

    /// Drop every token key and the cached user
    pub fn clear_session(&self) -> Result<(), SessionError> {
        self.store.remove_all(&[ADMIN_TOKEN_KEY, LEGACY_TOKEN_KEY, USER_KEY])
    }

    /// Tear the session down after the backend rejected the credential.
    ///
    /// Storage is cleared on every call. Returns `true` when the host should
    /// be told to navigate to its login route: the first teardown of a given
    /// token, however that token got into storage. Rejections that arrive
    /// after the token is already gone do not notify again.
    pub fn expire(&self) -> bool {
        // Held across read and clear so concurrent teardowns see one session
        let mut latch = self.latch();
        let current = self.token();

        if let Err(e) = self.clear_session() {
            tracing::warn!("Failed to clear session state: {}", e);
        }

        let notify = match &current {
            Some(token) => !latch.notified || latch.torn_down.as_ref() != Some(token),
            None => !latch.notified,
        };
        if notify {
            latch.notified = true;
            if current.is_some() {
                latch.torn_down = current;
            }
        }
        notify
    }

    pub fn is_expired(&self) -> bool {
        self.latch().notified
    }

    fn latch(&self) -> MutexGuard<'_, ExpiryLatch> {
        self.latch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("token_key", &self.token_key())
            .field("expired", &self.is_expired())
            .finish()
    }
}
