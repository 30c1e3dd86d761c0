use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SessionError, SessionStore};

pub const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    values: HashMap<String, String>,
    updated_at: Option<DateTime<Utc>>,
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            updated_at: None,
        }
    }
}

/// Session storage persisted as `session.json` in a config directory.
///
/// The file is read once on open and written through on every mutation. A
/// mutation only becomes visible in memory once the file has been replaced.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    state: Mutex<SessionFile>,
}

impl FileSessionStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let path = dir.join(SESSION_FILE_NAME);
        let state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                SessionFile::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            SessionFile::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().ok()?.updated_at
    }

    fn mutate<F>(&self, change: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut state = self.state.lock().map_err(|_| SessionError::Poisoned)?;
        let mut next = state.clone();
        change(&mut next.values);
        next.updated_at = Some(Utc::now());

        // Written while the lock is held so the file never lags a reader
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    fn persist(&self, file: &SessionFile) -> Result<(), SessionError> {
        let content = serde_json::to_string_pretty(file)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content)?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.state.lock().ok()?.values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.mutate(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.mutate(|values| {
            values.remove(key);
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), SessionError> {
        self.mutate(|values| {
            for key in keys {
                values.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileSessionStore::open(dir.path()).unwrap();
        store.set("adminToken", "abc").unwrap();
        assert!(store.updated_at().is_some());
        drop(store);

        let reopened = FileSessionStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("adminToken").as_deref(), Some("abc"));

        reopened.remove_all(&["adminToken", "user"]).unwrap();
        let again = FileSessionStore::open(dir.path()).unwrap();
        assert_eq!(again.get("adminToken"), None);
    }

    #[test]
    fn missing_or_empty_file_is_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("cfg");

        let store = FileSessionStore::open(&nested).unwrap();
        assert_eq!(store.get("token"), None);
        assert!(nested.exists());

        fs::write(nested.join(SESSION_FILE_NAME), "").unwrap();
        let store = FileSessionStore::open(&nested).unwrap();
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn failed_write_leaves_session_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        store.set("adminToken", "old").unwrap();
        let stamped = store.updated_at();

        // A directory in place of the file makes every write fail
        fs::remove_file(store.path()).unwrap();
        fs::create_dir(store.path()).unwrap();

        assert!(matches!(store.set("adminToken", "new"), Err(SessionError::Io(_))));
        assert_eq!(store.get("adminToken").as_deref(), Some("old"));

        assert!(store.remove_all(&["adminToken", "user"]).is_err());
        assert_eq!(store.get("adminToken").as_deref(), Some("old"));
        assert_eq!(store.updated_at(), stamped);
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SESSION_FILE_NAME), "{oops").unwrap();

        let result = FileSessionStore::open(dir.path());
        assert!(matches!(result, Err(SessionError::Serialization(_))));
    }
}
