//! @acp:module "Session Storage"
//! @acp:summary "Key-value persistence seam with file and in-memory backends"
//! @acp:domain session
//! @acp:layer io

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ThriveError};

/// Default storage key for onboarding sessions
pub const ONBOARDING_STORAGE_KEY: &str = "onboarding-storage";

/// Current envelope version written by this crate
pub const ENVELOPE_VERSION: u32 = 0;

/// Local key-value persistence, one serialized blob per key
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Persisted wrapper around a store's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub state: T,
    #[serde(default)]
    pub version: u32,
}

/// Read and decode the state stored under `key`
pub fn load_state<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    let envelope: Envelope<T> = serde_json::from_str(&raw)?;
    if envelope.version > ENVELOPE_VERSION {
        tracing::warn!(
            key,
            version = envelope.version,
            "Stored state is newer than this build understands"
        );
    }
    Ok(Some(envelope.state))
}

/// Encode and write `state` under `key`
pub fn save_state<T: Serialize>(store: &dyn KeyValueStore, key: &str, state: &T) -> Result<()> {
    let envelope = Envelope {
        state,
        version: ENVELOPE_VERSION,
    };
    store.set(key, &serde_json::to_string_pretty(&envelope)?)
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            || key.starts_with('.')
        {
            return Err(ThriveError::Other(format!("Invalid storage key: '{}'", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
        }

        // Write beside the target then rename so readers never see a partial blob
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        tracing::trace!(path = ?path, bytes = value.len(), "Persisted state");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-process store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| ThriveError::Other("Memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        value: u32,
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("user-storage").unwrap(), None);
        store.set("user-storage", "{}").unwrap();
        assert_eq!(store.get("user-storage").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("nested/user-storage.json").exists());

        store.remove("user-storage").unwrap();
        assert_eq!(store.get("user-storage").unwrap(), None);
        store.remove("user-storage").unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let store = FileStore::new("/tmp");
        assert!(store.path_for("../escape").is_err());
        assert!(store.path_for("a/b").is_err());
        assert!(store.path_for("").is_err());
        assert!(store.path_for("health-storage").is_ok());
    }

    #[test]
    fn test_envelope_format() {
        let store = MemoryStore::new();
        save_state(&store, "family-storage", &Blob { value: 7 }).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&store.get("family-storage").unwrap().unwrap()).unwrap();
        assert_eq!(raw["state"]["value"], 7);
        assert_eq!(raw["version"], 0);

        let loaded: Option<Blob> = load_state(&store, "family-storage").unwrap();
        assert_eq!(loaded, Some(Blob { value: 7 }));
    }

    #[test]
    fn test_envelope_without_version_loads() {
        let store = MemoryStore::new();
        store.set("k", r#"{"state": {"value": 1}}"#).unwrap();
        let loaded: Option<Blob> = load_state(&store, "k").unwrap();
        assert_eq!(loaded, Some(Blob { value: 1 }));
    }

    #[test]
    fn test_malformed_blob_errors() {
        let store = MemoryStore::new();
        store.set("k", "not json").unwrap();
        assert!(load_state::<Blob>(&store, "k").is_err());
    }
}
