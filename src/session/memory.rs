use std::collections::HashMap;
use std::sync::Mutex;

use super::{SessionError, SessionStore};

/// Process-local session storage
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        values.remove(key);
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
