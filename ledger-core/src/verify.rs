//! Integrity verification (read path)
//!
//! Three independent passes over a snapshot of the stored sequence:
//!
//! 1. [`verify_chain`] replays the hash chain. The expected previous hash is
//!    always the *recomputed* hash of the preceding entry, never the stored
//!    one, so a single break invalidates every later entry. Modification,
//!    deletion and insertion all surface this way. A second, independent
//!    tamper point further down is hidden behind the first. A record that
//!    no longer parses is reported on its own and skipped; the expected
//!    chain state carries past it unchanged.
//! 2. [`verify_signatures`] authenticates each entry's sender against the
//!    key registry. It knows nothing about hashes.
//! 3. [`assemble`] merges both verdicts per entry into an [`IntegrityReport`].
//!
//! Nothing here mutates the ledger.

use crate::{
    crypto,
    error::SignatureFailure,
    keys::KeyStore,
    policy::Policy,
    types::{Record, SENTINEL_HASH},
    Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Chain-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityViolation {
    /// Stored hash differs from the hash re-derived along the expected chain
    HashMismatch,
    /// Record lacks or garbles the fields the hash is computed from
    MalformedRecord,
}

/// Outcome of the chain replay for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerdict {
    /// Entry id
    pub sequence_id: u64,
    /// Previous hash the entry should have been linked to
    pub expected_prev_hash: String,
    /// Hash re-derived from the entry's fields and `expected_prev_hash`
    pub computed_hash: String,
    /// Hash found in storage
    pub stored_hash: String,
    /// `None` when the entry is chain-valid
    pub violation: Option<IntegrityViolation>,
    /// Parse error of a malformed record
    pub detail: Option<String>,
}

impl ChainVerdict {
    /// Whether the stored hash matched
    pub fn is_valid(&self) -> bool {
        self.violation.is_none()
    }
}

/// Replay the chain over `records` in stored order.
pub fn verify_chain(records: &[Record], policy: &Policy) -> Vec<ChainVerdict> {
    let mut expected_prev = SENTINEL_HASH.to_string();
    let mut verdicts = Vec::with_capacity(records.len());

    for record in records {
        let entry = match record {
            Record::Entry(entry) => entry,
            Record::Malformed(bad) => {
                verdicts.push(ChainVerdict {
                    sequence_id: bad.sequence_id,
                    expected_prev_hash: expected_prev.clone(),
                    computed_hash: String::new(),
                    stored_hash: bad.hash.clone(),
                    violation: Some(IntegrityViolation::MalformedRecord),
                    detail: Some(bad.error.clone()),
                });
                continue;
            }
        };

        let computed_hash = entry.expected_hash(&expected_prev);
        let violation = if computed_hash == entry.hash {
            None
        } else {
            Some(IntegrityViolation::HashMismatch)
        };

        let next_prev = policy.link_after(&computed_hash).to_string();

        verdicts.push(ChainVerdict {
            sequence_id: entry.sequence_id,
            expected_prev_hash: std::mem::replace(&mut expected_prev, next_prev),
            computed_hash,
            stored_hash: entry.hash.clone(),
            violation,
            detail: None,
        });
    }

    verdicts
}

/// Outcome of sender authentication for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVerdict {
    /// Signature verified against the sender's registered key
    Valid,
    /// Unsigned entry while signatures are optional, or unreadable record
    NotApplicable,
    /// Authentication failed
    Failed(SignatureFailure),
}

/// Authenticate every entry's sender.
///
/// Signed entries are always checked. Unsigned entries only fail when the
/// policy requires signatures, which admission would have enforced, so such
/// an entry can only come from direct storage edits.
pub fn verify_signatures(
    records: &[Record],
    policy: &Policy,
    keys: &dyn KeyStore,
) -> Result<Vec<SignatureVerdict>> {
    let mut key_cache: HashMap<&str, Option<String>> = HashMap::new();
    let mut verdicts = Vec::with_capacity(records.len());

    for record in records {
        let entry = match record.as_entry() {
            Some(entry) => entry,
            // nothing trustworthy to authenticate; the chain pass reports it
            None => {
                verdicts.push(SignatureVerdict::NotApplicable);
                continue;
            }
        };

        if entry.signature.is_none() && !policy.signature_required {
            verdicts.push(SignatureVerdict::NotApplicable);
            continue;
        }

        let public_key = match key_cache.get(entry.sender.as_str()) {
            Some(key) => key.clone(),
            None => {
                let key = keys.get(&entry.sender)?;
                key_cache.insert(entry.sender.as_str(), key.clone());
                key
            }
        };

        let verdict = match crypto::check_transfer_signature(
            entry.signature.as_deref(),
            public_key.as_deref(),
            &entry.signing_message(),
        ) {
            Ok(()) => SignatureVerdict::Valid,
            Err(failure) => SignatureVerdict::Failed(failure),
        };
        verdicts.push(verdict);
    }

    Ok(verdicts)
}

/// Name of a failing check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Chain break at or before this entry
    HashMismatch,
    /// Record could not be read as an entry
    MalformedRecord,
    /// Signature required but absent
    MissingSignature,
    /// Sender has no registered key
    UnknownSigner,
    /// Signature does not verify
    InvalidSignature,
}

impl From<IntegrityViolation> for Reason {
    fn from(violation: IntegrityViolation) -> Self {
        match violation {
            IntegrityViolation::HashMismatch => Reason::HashMismatch,
            IntegrityViolation::MalformedRecord => Reason::MalformedRecord,
        }
    }
}

impl From<SignatureFailure> for Reason {
    fn from(failure: SignatureFailure) -> Self {
        match failure {
            SignatureFailure::MissingSignature => Reason::MissingSignature,
            SignatureFailure::UnknownSigner => Reason::UnknownSigner,
            SignatureFailure::InvalidSignature => Reason::InvalidSignature,
        }
    }
}

/// Combined verdict for one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReport {
    /// Entry id
    pub id: u64,

    /// Passed every enabled check
    pub valid: bool,

    /// Failing checks, chain first
    pub reasons: Vec<Reason>,

    /// Chain diagnostics, only on hash mismatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_prev_hash: Option<String>,

    /// Chain diagnostics, only on hash mismatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_hash: Option<String>,

    /// Chain diagnostics, only on hash mismatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_hash: Option<String>,

    /// Parse error, only on malformed records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Overall verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Every entry passed every enabled check
    #[serde(rename = "OK")]
    Ok,
    /// At least one entry failed
    #[serde(rename = "KO")]
    Ko,
}

/// Result of a verification pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// OK iff nothing failed
    pub status: Status,
    /// Entries examined
    pub total_count: usize,
    /// Entries passing every check
    pub valid_count: usize,
    /// Entries failing at least one check
    pub invalid_count: usize,
    /// Ids of valid entries, ledger order
    pub valid_ids: Vec<u64>,
    /// Failed entries, ledger order
    pub invalid_entries: Vec<EntryReport>,
}

impl IntegrityReport {
    /// Whether the ledger verified clean
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Report entry for `id`, if it failed
    pub fn invalid_entry(&self, id: u64) -> Option<&EntryReport> {
        self.invalid_entries.iter().find(|e| e.id == id)
    }
}

/// Merge per-entry verdicts. Both slices are in the same (ledger) order.
pub fn assemble(chain: &[ChainVerdict], signatures: &[SignatureVerdict]) -> IntegrityReport {
    let mut valid_ids = Vec::new();
    let mut invalid_entries = Vec::new();

    for (index, verdict) in chain.iter().enumerate() {
        let mut reasons: Vec<Reason> = verdict.violation.into_iter().map(Reason::from).collect();
        if let Some(SignatureVerdict::Failed(failure)) = signatures.get(index) {
            reasons.push(Reason::from(*failure));
        }

        if reasons.is_empty() {
            valid_ids.push(verdict.sequence_id);
            continue;
        }

        let mismatch = verdict.violation == Some(IntegrityViolation::HashMismatch);
        let diagnostics = |value: &String| mismatch.then(|| value.clone());
        tracing::debug!(
            sequence_id = verdict.sequence_id,
            ?reasons,
            "Entry failed verification"
        );

        invalid_entries.push(EntryReport {
            id: verdict.sequence_id,
            valid: false,
            reasons,
            expected_prev_hash: diagnostics(&verdict.expected_prev_hash),
            computed_hash: diagnostics(&verdict.computed_hash),
            stored_hash: diagnostics(&verdict.stored_hash),
            detail: verdict.detail.clone(),
        });
    }

    let status = if invalid_entries.is_empty() {
        Status::Ok
    } else {
        Status::Ko
    };

    IntegrityReport {
        status,
        total_count: chain.len(),
        valid_count: valid_ids.len(),
        invalid_count: invalid_entries.len(),
        valid_ids,
        invalid_entries,
    }
}

/// Run every enabled check over `records` and assemble the report
pub fn verify(records: &[Record], policy: &Policy, keys: &dyn KeyStore) -> Result<IntegrityReport> {
    let chain = verify_chain(records, policy);
    let signatures = verify_signatures(records, policy, keys)?;
    Ok(assemble(&chain, &signatures))
}
