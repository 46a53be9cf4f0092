//! Admission validator (write path)
//!
//! Every check runs before the entry exists; a rejected transfer leaves
//! no trace. Callers must hold the ledger's write lock between reading the
//! tail and appending the result.

use crate::{
    crypto,
    hash,
    keys::KeyStore,
    policy::Policy,
    types::{Entry, Record, TransferRequest, SENTINEL_HASH},
    Error, Result,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Structural checks that need no ledger state
pub fn validate_request(request: &TransferRequest) -> Result<()> {
    if request.p1.trim().is_empty() {
        return Err(Error::Validation("sender (p1) is required".to_string()));
    }

    if request.p2.trim().is_empty() {
        return Err(Error::Validation("recipient (p2) is required".to_string()));
    }

    if request.a <= Decimal::ZERO {
        return Err(Error::Validation("amount (a) must be positive".to_string()));
    }

    if let Some(ref t) = request.t {
        DateTime::parse_from_rfc3339(t)
            .map_err(|e| Error::Validation(format!("timestamp (t) is not ISO-8601: {}", e)))?;
    }

    Ok(())
}

/// Id the next entry takes after `tail`.
///
/// The tail comes from untrusted storage, so its id may be anything.
pub fn next_sequence_id(tail: Option<&Record>) -> Result<u64> {
    match tail {
        None => Ok(1),
        Some(record) => record.sequence_id().checked_add(1).ok_or_else(|| {
            Error::Storage(format!(
                "tail sequence id {} leaves no room for another entry",
                record.sequence_id()
            ))
        }),
    }
}

/// Validate `request` against the current `tail` and build the entry to append.
pub fn admit(
    request: TransferRequest,
    tail: Option<&Record>,
    policy: &Policy,
    keys: &dyn KeyStore,
) -> Result<Entry> {
    validate_request(&request)?;

    let TransferRequest {
        p1: sender,
        p2: recipient,
        a: amount,
        t,
        signature,
    } = request;
    let timestamp = t.unwrap_or_else(now_timestamp);

    if policy.signature_required || signature.is_some() {
        let public_key = keys.get(&sender)?;
        let message = hash::signing_message(&sender, &recipient, &timestamp, &amount);
        crypto::check_transfer_signature(signature.as_deref(), public_key.as_deref(), &message)?;
    }

    let sequence_id = next_sequence_id(tail)?;
    let prev_hash = tail
        .map(|record| policy.link_after(record.hash()))
        .unwrap_or(SENTINEL_HASH);
    let hash = hash::chain_hash(&sender, &recipient, &timestamp, &amount, prev_hash);

    Ok(Entry {
        sequence_id,
        sender,
        recipient,
        timestamp,
        amount,
        hash,
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::KeyPair, error::SignatureFailure, keys::MemoryKeyStore};
    use rust_decimal_macros::dec;

    const TS: &str = "2024-01-01T00:00:00+00:00";

    fn request(amount: Decimal) -> TransferRequest {
        TransferRequest::new("alice", "bob", amount).at(TS)
    }

    #[test]
    fn test_first_entry_links_to_sentinel() {
        let keys = MemoryKeyStore::new();
        let entry = admit(request(dec!(100)), None, &Policy::chained(), &keys).unwrap();

        assert_eq!(entry.sequence_id, 1);
        assert_eq!(entry.hash, hash::chain_hash("alice", "bob", TS, &dec!(100), "0"));
        assert!(entry.signature.is_none());
    }

    #[test]
    fn test_next_entry_links_to_tail() {
        let keys = MemoryKeyStore::new();
        let policy = Policy::chained();
        let first = admit(request(dec!(100)), None, &policy, &keys).unwrap();
        let second = admit(
            TransferRequest::new("bob", "charlie", dec!(50)).at(TS),
            Some(&Record::from(first.clone())),
            &policy,
            &keys,
        )
        .unwrap();

        assert_eq!(second.sequence_id, 2);
        assert_eq!(second.hash, second.expected_hash(&first.hash));
    }

    #[test]
    fn test_independent_mode_ignores_tail() {
        let keys = MemoryKeyStore::new();
        let policy = Policy::independent();
        let first = admit(request(dec!(100)), None, &policy, &keys).unwrap();
        let tail = Record::from(first.clone());
        let second = admit(request(dec!(100)), Some(&tail), &policy, &keys).unwrap();

        assert_eq!(second.sequence_id, 2);
        assert_eq!(first.hash, second.hash);
    }

    #[test]
    fn test_sequence_follows_tail_id() {
        let keys = MemoryKeyStore::new();
        let mut tail = admit(request(dec!(1)), None, &Policy::chained(), &keys).unwrap();
        tail.sequence_id = 41;
        let tail = Record::from(tail);
        let next = admit(request(dec!(1)), Some(&tail), &Policy::chained(), &keys).unwrap();
        assert_eq!(next.sequence_id, 42);
    }

    #[test]
    fn test_exhausted_tail_id_is_refused() {
        let keys = MemoryKeyStore::new();
        let mut tail = admit(request(dec!(1)), None, &Policy::chained(), &keys).unwrap();
        tail.sequence_id = u64::MAX;
        let tail = Record::from(tail);

        let err = admit(request(dec!(1)), Some(&tail), &Policy::chained(), &keys).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_unreadable_tail_still_links() {
        let keys = MemoryKeyStore::new();
        let tail = Record::from_value(serde_json::json!({"id": 5, "h": "abc"}), 4);

        let next = admit(request(dec!(1)), Some(&tail), &Policy::chained(), &keys).unwrap();
        assert_eq!(next.sequence_id, 6);
        assert_eq!(next.hash, next.expected_hash("abc"));
    }

    #[test]
    fn test_validation_errors() {
        let keys = MemoryKeyStore::new();
        let policy = Policy::chained();

        for bad in [
            TransferRequest::new("", "bob", dec!(1)),
            TransferRequest::new("alice", "  ", dec!(1)),
            TransferRequest::new("alice", "bob", Decimal::ZERO),
            TransferRequest::new("alice", "bob", dec!(-5)),
            TransferRequest::new("alice", "bob", dec!(5)).at("yesterday"),
        ] {
            let err = admit(bad, None, &policy, &keys).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{err}");
        }
    }

    #[test]
    fn test_timestamp_captured_when_absent() {
        let keys = MemoryKeyStore::new();
        let entry = admit(
            TransferRequest::new("alice", "bob", dec!(1)),
            None,
            &Policy::chained(),
            &keys,
        )
        .unwrap();
        assert!(DateTime::parse_from_rfc3339(&entry.timestamp).is_ok());
        assert!(entry.timestamp.ends_with("+00:00"));
    }

    #[test]
    fn test_amount_stored_as_transmitted() {
        let keys = MemoryKeyStore::new();
        let entry = admit(request(dec!(12.500)), None, &Policy::chained(), &keys).unwrap();
        assert_eq!(entry.amount.to_string(), "12.500");
        assert_eq!(entry.hash, hash::chain_hash("alice", "bob", TS, &dec!(12.500), "0"));
    }

    #[test]
    fn test_signature_required_outcomes() {
        let keys = MemoryKeyStore::new();
        let policy = Policy::signed();
        let alice = KeyPair::generate();
        let sig = alice.sign_transfer("alice", "bob", TS, &dec!(100));

        let err = admit(request(dec!(100)), None, &policy, &keys).unwrap_err();
        assert!(matches!(err, Error::Signature(SignatureFailure::MissingSignature)));

        let err = admit(request(dec!(100)).signed(sig.clone()), None, &policy, &keys).unwrap_err();
        assert!(matches!(err, Error::Signature(SignatureFailure::UnknownSigner)));

        keys.put("alice", &KeyPair::generate().public_key_pem().unwrap()).unwrap();
        let err = admit(request(dec!(100)).signed(sig.clone()), None, &policy, &keys).unwrap_err();
        assert!(matches!(err, Error::Signature(SignatureFailure::InvalidSignature)));

        keys.put("alice", &alice.public_key_pem().unwrap()).unwrap();
        let entry = admit(request(dec!(100)).signed(sig.clone()), None, &policy, &keys).unwrap();
        assert_eq!(entry.signature, Some(sig));
    }

    #[test]
    fn test_signature_over_literal_amount_text() {
        let keys = MemoryKeyStore::new();
        let alice = KeyPair::generate();
        keys.put("alice", &alice.public_key_pem().unwrap()).unwrap();

        // the client signs exactly the text it sends
        let message = format!("alice|bob|{}|12.50", TS);
        let sig = alice.sign(message.as_bytes());
        let parsed: TransferRequest = serde_json::from_value(serde_json::json!({
            "p1": "alice", "p2": "bob", "a": "12.50", "t": TS, "signature": sig,
        }))
        .unwrap();

        let entry = admit(parsed, None, &Policy::signed(), &keys).unwrap();
        assert_eq!(entry.signing_message(), message);

        // a differently scaled amount is a different message
        let rescaled = request(dec!(12.5)).signed(sig);
        let err = admit(rescaled, None, &Policy::signed(), &keys).unwrap_err();
        assert!(matches!(err, Error::Signature(SignatureFailure::InvalidSignature)));
    }

    #[test]
    fn test_optional_signature_still_checked() {
        let keys = MemoryKeyStore::new();
        let err = admit(
            request(dec!(100)).signed("AAAA"),
            None,
            &Policy::chained(),
            &keys,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Signature(SignatureFailure::UnknownSigner)));
    }
}
