//! Error types for the ledger

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed transfer or registration (empty party, non-positive amount, bad timestamp)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Sender authentication failed at admission
    #[error("Signature error: {0}")]
    Signature(SignatureFailure),

    /// Storage collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable kind, used on the wire and as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Signature(_) => "signature_error",
            Error::Storage(_) => "storage_error",
            Error::Serialization(_) => "serialization_error",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
        }
    }

    /// True for rejections caused by the request itself rather than the system
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Signature(_))
    }
}

impl From<SignatureFailure> for Error {
    fn from(failure: SignatureFailure) -> Self {
        Error::Signature(failure)
    }
}

/// Why a sender signature was not accepted.
///
/// Shared by the admission path (as an error) and the signature verifier
/// (as a per-entry reason).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureFailure {
    /// Signatures are required but none was supplied/stored
    MissingSignature,
    /// The sender has no registered public key
    UnknownSigner,
    /// The signature does not verify against the sender's key
    InvalidSignature,
}

impl SignatureFailure {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureFailure::MissingSignature => "missing_signature",
            SignatureFailure::UnknownSigner => "unknown_signer",
            SignatureFailure::InvalidSignature => "invalid_signature",
        }
    }
}

impl fmt::Display for SignatureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
