//! Core types for the ledger
//!
//! Field names on the wire are the short ones the transfer API has always
//! used (`id`, `p1`, `p2`, `t`, `a`, `h`). Amounts are exact decimals and
//! travel as JSON strings; JSON numbers are accepted on input.

use crate::hash;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Previous-hash placeholder used for the first entry of a chain
pub const SENTINEL_HASH: &str = "0";

/// One recorded transfer, linked to its predecessor by `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Position in the ledger, assigned at append time (starts at 1)
    #[serde(rename = "id")]
    pub sequence_id: u64,

    /// Paying party
    #[serde(rename = "p1")]
    pub sender: String,

    /// Receiving party
    #[serde(rename = "p2")]
    pub recipient: String,

    /// ISO-8601 timestamp, hashed verbatim
    #[serde(rename = "t")]
    pub timestamp: String,

    /// Transferred amount (strictly positive when admitted)
    #[serde(rename = "a")]
    pub amount: Decimal,

    /// Chain hash, lowercase hex SHA-256. Records written without one load as empty.
    #[serde(rename = "h", default)]
    pub hash: String,

    /// Base64 ed25519 signature over `p1|p2|t|a`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Entry {
    /// Chain hash this entry should carry if its predecessor's hash is `prev_hash`
    pub fn expected_hash(&self, prev_hash: &str) -> String {
        hash::chain_hash(
            &self.sender,
            &self.recipient,
            &self.timestamp,
            &self.amount,
            prev_hash,
        )
    }

    /// Message the sender signs; excludes both hashes
    pub fn signing_message(&self) -> String {
        hash::signing_message(&self.sender, &self.recipient, &self.timestamp, &self.amount)
    }

    /// Whether `person` sent or received this transfer
    pub fn involves(&self, person: &str) -> bool {
        self.sender == person || self.recipient == person
    }
}

/// A stored record that does not read as an [`Entry`], e.g. a hand-edited
/// record with a field removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    /// Stored `id`, or the 1-based storage position when that is unreadable too
    pub sequence_id: u64,

    /// Stored `h`, empty when absent
    pub hash: String,

    /// Why the record did not parse
    pub error: String,
}

/// One slot of the stored sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Well-formed entry
    Entry(Entry),
    /// Unreadable record, kept in place so positions are preserved
    Malformed(MalformedRecord),
}

impl Record {
    /// Classify one raw JSON record found at `position` (0-based)
    pub fn from_value(value: Value, position: usize) -> Self {
        let sequence_id = value
            .get("id")
            .and_then(Value::as_u64)
            .unwrap_or(position as u64 + 1);
        let hash = value
            .get("h")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match serde_json::from_value::<Entry>(value) {
            Ok(entry) => Record::Entry(entry),
            Err(e) => Record::Malformed(MalformedRecord {
                sequence_id,
                hash,
                error: e.to_string(),
            }),
        }
    }

    /// Stored id
    pub fn sequence_id(&self) -> u64 {
        match self {
            Record::Entry(entry) => entry.sequence_id,
            Record::Malformed(bad) => bad.sequence_id,
        }
    }

    /// Stored chain hash
    pub fn hash(&self) -> &str {
        match self {
            Record::Entry(entry) => &entry.hash,
            Record::Malformed(bad) => &bad.hash,
        }
    }

    /// The entry, if the record is readable
    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Record::Entry(entry) => Some(entry),
            Record::Malformed(_) => None,
        }
    }

    /// The entry, if the record is readable
    pub fn into_entry(self) -> Option<Entry> {
        match self {
            Record::Entry(entry) => Some(entry),
            Record::Malformed(_) => None,
        }
    }
}

impl From<Entry> for Record {
    fn from(entry: Entry) -> Self {
        Record::Entry(entry)
    }
}

/// A proposed transfer, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Sender
    pub p1: String,

    /// Recipient
    pub p2: String,

    /// Amount
    pub a: Decimal,

    /// Optional explicit timestamp (RFC 3339); captured at admission otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Optional base64 signature; mandatory when signatures are required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl TransferRequest {
    /// Unsigned request with a capture-at-admission timestamp
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: Decimal) -> Self {
        Self {
            p1: sender.into(),
            p2: recipient.into(),
            a: amount,
            t: None,
            signature: None,
        }
    }

    /// Pin the timestamp
    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.t = Some(timestamp.into());
        self
    }

    /// Attach a base64 signature
    pub fn signed(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// Net position of one person over the raw stored records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Person
    pub person: String,

    /// Received minus sent
    pub balance: Decimal,
}

impl Balance {
    /// Fold `entries` into the balance of `person`.
    ///
    /// Operates on whatever is stored; verification state is not consulted.
    pub fn fold<'a>(person: &str, entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let balance = entries.into_iter().fold(Decimal::ZERO, |mut acc, entry| {
            if entry.recipient == person {
                acc += entry.amount;
            }
            if entry.sender == person {
                acc -= entry.amount;
            }
            acc
        });

        Self {
            person: person.to_string(),
            balance,
        }
    }
}
