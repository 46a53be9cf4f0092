//! Chainledger Core
//!
//! Tamper-evident transfer ledger with chained hashes and sender signatures.
//!
//! # Architecture
//!
//! - **Admission** (write path): validates a transfer, links it to the tail
//!   and optionally authenticates the sender before anything is stored
//! - **Verification** (read path): replays the stored sequence and reports
//!   every entry whose hash or signature no longer holds
//! - **Single Writer**: one lock around read-tail-then-append
//! - **Untrusted Storage**: stores and key registries are injected
//!
//! # Invariants
//!
//! - For a ledger written only through admission, `entries[i]` is hashed
//!   against `entries[i-1].hash` (sentinel `"0"` for the first entry)
//! - Verification never mutates the ledger
//! - Signature validity and chain validity are reported independently

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod admission;
pub mod config;
pub mod crypto;
pub mod error;
pub mod hash;
pub mod keys;
pub mod ledger;
pub mod metrics;
pub mod policy;
pub mod store;
pub mod types;
pub mod verify;

// Re-exports
pub use config::Config;
pub use error::{Error, Result, SignatureFailure};
pub use keys::{JsonKeyStore, KeyStore, MemoryKeyStore};
pub use ledger::Ledger;
pub use metrics::Metrics;
pub use policy::{ChainMode, Policy};
pub use store::{JsonFileStore, LedgerStore, MemoryStore};
pub use types::{Balance, Entry, MalformedRecord, Record, TransferRequest, SENTINEL_HASH};
pub use verify::{EntryReport, IntegrityReport, Reason, Status};
