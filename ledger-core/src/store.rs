//! Ledger storage collaborators
//!
//! The core only needs `append` and `read_records`. Storage is untrusted:
//! anything may rewrite it behind the ledger's back, which is exactly what
//! verification is for. A record that no longer parses is surfaced as
//! [`Record::Malformed`] in its slot rather than failing the whole read.
//!
//! - `MemoryStore` - in-process vector, used by tests to simulate tampering
//! - `JsonFileStore` - pretty-printed JSON array on disk (`tx.json`)

use crate::{
    types::{Entry, Record},
    Error, Result,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered, append-only entry storage
pub trait LedgerStore: Send + Sync {
    /// Append one entry at the tail
    fn append(&self, entry: Entry) -> Result<()>;

    /// Point-in-time snapshot of every stored record, in ledger order
    fn read_records(&self) -> Result<Vec<Record>>;

    /// Readable entries only, in ledger order
    fn read_all(&self) -> Result<Vec<Entry>> {
        Ok(self
            .read_records()?
            .into_iter()
            .filter_map(Record::into_entry)
            .collect())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole sequence, bypassing admission
    pub fn replace_all(&self, entries: Vec<Entry>) {
        self.replace_records(entries.into_iter().map(Record::from).collect());
    }

    /// Replace the whole sequence with arbitrary records, unreadable ones included
    pub fn replace_records(&self, records: Vec<Record>) {
        *self.records.write() = records;
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl LedgerStore for MemoryStore {
    fn append(&self, entry: Entry) -> Result<()> {
        self.records.write().push(Record::Entry(entry));
        Ok(())
    }

    fn read_records(&self) -> Result<Vec<Record>> {
        Ok(self.records.read().clone())
    }
}

/// JSON-array file store
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    /// Open or create the file (created as `[]`)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            fs::write(&path, "[]")?;
            tracing::info!(path = %path.display(), "Created empty ledger file");
        }

        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw records, untouched; only the enclosing array must be valid JSON
    fn load(&self) -> Result<Vec<Value>> {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            Error::Storage(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, records: &[Value]) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LedgerStore for JsonFileStore {
    fn append(&self, entry: Entry) -> Result<()> {
        let _guard = self.lock.write();
        let mut records = self.load()?;
        let sequence_id = entry.sequence_id;
        records.push(serde_json::to_value(&entry)?);
        self.save(&records)?;

        tracing::debug!(
            sequence_id,
            path = %self.path.display(),
            "Entry appended"
        );

        Ok(())
    }

    fn read_records(&self) -> Result<Vec<Record>> {
        let _guard = self.lock.read();
        let records: Vec<Record> = self
            .load()?
            .into_iter()
            .enumerate()
            .map(|(position, value)| Record::from_value(value, position))
            .collect();

        let malformed = records.iter().filter(|r| r.as_entry().is_none()).count();
        if malformed > 0 {
            tracing::warn!(
                malformed,
                path = %self.path.display(),
                "Unreadable records in ledger file"
            );
        }

        Ok(records)
    }
}
