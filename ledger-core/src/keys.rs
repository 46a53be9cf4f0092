//! Public-key registry collaborators
//!
//! At most one key per person; re-registration overwrites. The ledger core
//! only ever calls `get`.

use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Person -> PEM public key lookup
pub trait KeyStore: Send + Sync {
    /// Currently registered key
    fn get(&self, person: &str) -> Result<Option<String>>;

    /// Register or replace a key (last write wins)
    fn put(&self, person: &str, public_key_pem: &str) -> Result<()>;
}

/// In-memory registry
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyStore {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, person: &str) -> Result<Option<String>> {
        Ok(self.keys.read().get(person).cloned())
    }

    fn put(&self, person: &str, public_key_pem: &str) -> Result<()> {
        self.keys
            .write()
            .insert(person.to_string(), public_key_pem.to_string());
        Ok(())
    }
}

/// JSON object file registry (`keys.json`)
#[derive(Debug)]
pub struct JsonKeyStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonKeyStore {
    /// Open or create the file (created as `{}`)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            fs::write(&path, "{}")?;
        }

        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            Error::Storage(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }
}

impl KeyStore for JsonKeyStore {
    fn get(&self, person: &str) -> Result<Option<String>> {
        let _guard = self.lock.read();
        Ok(self.load()?.remove(person))
    }

    fn put(&self, person: &str, public_key_pem: &str) -> Result<()> {
        let _guard = self.lock.write();
        let mut keys = self.load()?;
        keys.insert(person.to_string(), public_key_pem.to_string());

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&keys)?)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(person, "Public key stored");
        Ok(())
    }
}
