//! Chain hash construction
//!
//! Both the hashed and the signed message are the literal pipe-joined
//! fields, never a structured encoding, so any implementation can
//! re-derive them.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Text of an amount as transmitted; the parsed scale is kept, so `12.50` stays `12.50`.
pub fn canonical_amount(amount: &Decimal) -> String {
    amount.to_string()
}

/// `sender|recipient|timestamp|amount`
pub fn signing_message(sender: &str, recipient: &str, timestamp: &str, amount: &Decimal) -> String {
    format!(
        "{}|{}|{}|{}",
        sender,
        recipient,
        timestamp,
        canonical_amount(amount)
    )
}

/// SHA-256 of `sender|recipient|timestamp|amount|prev_hash`, lowercase hex (64 chars).
pub fn chain_hash(
    sender: &str,
    recipient: &str,
    timestamp: &str,
    amount: &Decimal,
    prev_hash: &str,
) -> String {
    let message = format!(
        "{}|{}",
        signing_message(sender, recipient, timestamp, amount),
        prev_hash
    );
    hash_message(message.as_bytes())
}

/// Hex SHA-256 of arbitrary bytes
pub fn hash_message(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
