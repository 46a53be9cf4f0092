//! Main ledger orchestration layer
//!
//! Ties the admission validator, the verifier and the storage/key
//! collaborators into one high-level API.
//!
//! Admission reads the tail and appends under a single exclusive lock, so
//! two transfers can never claim the same predecessor. Reads work on a
//! snapshot taken by the store and never wait for that lock.
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{Config, Ledger, TransferRequest};
//! use rust_decimal::Decimal;
//!
//! fn main() -> ledger_core::Result<()> {
//!     let ledger = Ledger::open(&Config::default())?;
//!
//!     ledger.submit(TransferRequest::new("alice", "bob", Decimal::from(100)))?;
//!     assert!(ledger.verify()?.is_ok());
//!     Ok(())
//! }
//! ```

use crate::{
    admission, crypto,
    keys::{JsonKeyStore, KeyStore, MemoryKeyStore},
    metrics::Metrics,
    policy::Policy,
    store::{JsonFileStore, LedgerStore, MemoryStore},
    types::{Balance, Entry, TransferRequest},
    verify::{self, IntegrityReport},
    Config, Error, Result,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Main ledger interface
pub struct Ledger {
    /// Entry storage (untrusted)
    store: Arc<dyn LedgerStore>,

    /// Public key registry
    keys: Arc<dyn KeyStore>,

    /// Checks in force
    policy: Policy,

    /// Serializes admission
    write_lock: Mutex<()>,

    /// Prometheus collector (optional)
    metrics: Option<Metrics>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("policy", &self.policy)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Ledger {
    /// Build over injected collaborators
    pub fn new(store: Arc<dyn LedgerStore>, keys: Arc<dyn KeyStore>, policy: Policy) -> Self {
        Self {
            store,
            keys,
            policy,
            write_lock: Mutex::new(()),
            metrics: None,
        }
    }

    /// Purely in-memory ledger
    pub fn in_memory(policy: Policy) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryKeyStore::new()),
            policy,
        )
    }

    /// Open the JSON files under `config.data_dir`
    pub fn open(config: &Config) -> Result<Self> {
        let store = JsonFileStore::open(config.transactions_path())?;
        let keys = JsonKeyStore::open(config.keys_path())?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            chaining = %config.policy.chaining,
            signature_required = config.policy.signature_required,
            "Ledger opened"
        );

        Ok(Self::new(Arc::new(store), Arc::new(keys), config.policy))
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Checks in force
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Metrics collector, if attached
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Admit a transfer and append it.
    ///
    /// All-or-nothing: on rejection nothing is written.
    pub fn submit(&self, request: TransferRequest) -> Result<Entry> {
        let _guard = self.write_lock.lock();

        let result = self.store.read_records().and_then(|records| {
            admission::admit(request, records.last(), &self.policy, self.keys.as_ref())
        });

        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                if e.is_rejection() {
                    tracing::warn!(kind = e.kind(), error = %e, "Transfer rejected");
                } else {
                    tracing::error!(kind = e.kind(), error = %e, "Transfer could not be admitted");
                }
                if let Some(ref metrics) = self.metrics {
                    metrics.record_rejection(e.kind());
                }
                return Err(e);
            }
        };

        self.store.append(entry.clone())?;

        tracing::info!(
            sequence_id = entry.sequence_id,
            sender = %entry.sender,
            recipient = %entry.recipient,
            amount = %entry.amount,
            signed = entry.signature.is_some(),
            "Transfer admitted"
        );
        if let Some(ref metrics) = self.metrics {
            metrics.transfers_admitted.inc();
        }

        Ok(entry)
    }

    /// Every readable stored entry, ledger order
    pub fn entries(&self) -> Result<Vec<Entry>> {
        self.store.read_all()
    }

    /// Entries where `person` is sender or recipient, ledger order
    pub fn entries_for(&self, person: &str) -> Result<Vec<Entry>> {
        let mut entries = self.store.read_all()?;
        entries.retain(|entry| entry.involves(person));
        Ok(entries)
    }

    /// Received minus sent over the raw stored records
    pub fn balance(&self, person: &str) -> Result<Balance> {
        let entries = self.store.read_all()?;
        Ok(Balance::fold(person, &entries))
    }

    /// Run the integrity checks over a snapshot of the ledger
    pub fn verify(&self) -> Result<IntegrityReport> {
        let records = self.store.read_records()?;
        let report = verify::verify(&records, &self.policy, self.keys.as_ref())?;

        if report.is_ok() {
            tracing::info!(total = report.total_count, "Ledger verified");
        } else {
            tracing::warn!(
                total = report.total_count,
                invalid = report.invalid_count,
                first_invalid = report.invalid_entries.first().map(|e| e.id),
                "Ledger integrity violated"
            );
        }
        if let Some(ref metrics) = self.metrics {
            metrics.record_verification(report.total_count, report.invalid_count);
        }

        Ok(report)
    }

    /// Register or replace `person`'s public key (SPKI PEM)
    pub fn register_key(&self, person: &str, public_key_pem: &str) -> Result<()> {
        if person.trim().is_empty() {
            return Err(Error::Validation("person is required".to_string()));
        }
        crypto::parse_public_key(public_key_pem)?;

        self.keys.put(person, public_key_pem)?;
        tracing::info!(person, "Public key registered");
        Ok(())
    }

    /// Currently registered key for `person`
    pub fn public_key(&self, person: &str) -> Result<Option<String>> {
        self.keys.get(person)
    }
}
