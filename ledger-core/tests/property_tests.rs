//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Admission-only ledgers always verify clean
//! - Chain hash is a pure function
//! - Tampering at position k invalidates exactly k..N-1
//! - Balances fold to zero across all parties

use ledger_core::{
    hash::chain_hash, Entry, Ledger, LedgerStore, MemoryKeyStore, MemoryStore, Policy, Reason,
    Status, TransferRequest,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Strategy for generating valid amounts (positive decimals)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..1_000_000_00u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Strategy for generating party names
fn party_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("alice".to_string()),
        Just("bob".to_string()),
        Just("charlie".to_string()),
        "[a-z]{3,8}",
    ]
}

/// Strategy for generating transfer requests
fn transfer_strategy() -> impl Strategy<Value = TransferRequest> {
    (party_strategy(), party_strategy(), amount_strategy())
        .prop_map(|(sender, recipient, amount)| TransferRequest::new(sender, recipient, amount))
}

/// Build an in-memory ledger and keep a handle on its store
fn ledger_with(transfers: &[TransferRequest]) -> (Arc<MemoryStore>, Ledger) {
    let store = Arc::new(MemoryStore::new());
    let ledger = Ledger::new(store.clone(), Arc::new(MemoryKeyStore::new()), Policy::chained());
    for transfer in transfers {
        ledger.submit(transfer.clone()).unwrap();
    }
    (store, ledger)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: any admission-only ledger verifies OK
    #[test]
    fn prop_admitted_ledger_verifies(transfers in prop::collection::vec(transfer_strategy(), 0..25)) {
        let (_, ledger) = ledger_with(&transfers);
        let report = ledger.verify().unwrap();

        prop_assert_eq!(report.status, Status::Ok);
        prop_assert_eq!(report.invalid_count, 0);
        prop_assert_eq!(report.valid_count, transfers.len());
    }

    /// Property: chain hash is deterministic and 64 lowercase hex chars
    #[test]
    fn prop_chain_hash_pure(
        sender in party_strategy(),
        recipient in party_strategy(),
        amount in amount_strategy(),
        prev in "[0-9a-f]{64}",
    ) {
        let ts = "2024-01-01T00:00:00+00:00";
        let h1 = chain_hash(&sender, &recipient, ts, &amount, &prev);
        let h2 = chain_hash(&sender, &recipient, ts, &amount, &prev);

        prop_assert_eq!(&h1, &h2);
        prop_assert_eq!(h1.len(), 64);
        prop_assert!(h1.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    /// Property: altering the amount at k invalidates exactly k..N-1
    #[test]
    fn prop_amount_tamper_cascades(
        transfers in prop::collection::vec(transfer_strategy(), 1..20),
        pick in any::<prop::sample::Index>(),
        bump in amount_strategy(),
    ) {
        let (store, ledger) = ledger_with(&transfers);
        let k = pick.index(transfers.len());

        let mut entries: Vec<Entry> = store.read_all().unwrap();
        entries[k].amount += bump;
        store.replace_all(entries);

        let report = ledger.verify().unwrap();
        let expected_invalid: Vec<u64> = (k as u64 + 1..=transfers.len() as u64).collect();
        let expected_valid: Vec<u64> = (1..=k as u64).collect();
        let invalid: Vec<u64> = report.invalid_entries.iter().map(|e| e.id).collect();

        prop_assert_eq!(report.status, Status::Ko);
        prop_assert_eq!(invalid, expected_invalid);
        prop_assert_eq!(report.valid_ids, expected_valid);
        prop_assert!(report.invalid_entries.iter().all(|e| e.reasons == vec![Reason::HashMismatch]));
    }

    /// Property: deleting a non-tail entry invalidates every later entry
    #[test]
    fn prop_deletion_detected(
        transfers in prop::collection::vec(transfer_strategy(), 2..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let (store, ledger) = ledger_with(&transfers);
        let k = pick.index(transfers.len() - 1);

        let mut entries: Vec<Entry> = store.read_all().unwrap();
        entries.remove(k);
        store.replace_all(entries);

        let report = ledger.verify().unwrap();
        let expected_valid: Vec<u64> = (1..=k as u64).collect();

        prop_assert_eq!(report.valid_ids, expected_valid);
        prop_assert_eq!(report.invalid_count, transfers.len() - 1 - k);
    }

    /// Property: balances over all parties sum to zero
    #[test]
    fn prop_balances_conserve(transfers in prop::collection::vec(transfer_strategy(), 0..25)) {
        let (_, ledger) = ledger_with(&transfers);

        let mut parties: Vec<String> = transfers
            .iter()
            .flat_map(|t| [t.p1.clone(), t.p2.clone()])
            .collect();
        parties.sort();
        parties.dedup();

        let total: Decimal = parties
            .iter()
            .map(|p| ledger.balance(p).unwrap().balance)
            .sum();
        prop_assert_eq!(total, Decimal::ZERO);
    }
}
