//! Cryptographic operations for sender authentication
//!
//! This module provides:
//! - Ed25519 key pair generation, PEM import/export
//! - Base64 signatures over the pipe-joined transfer message
//! - Verification against a registered SPKI PEM public key

use crate::{error::SignatureFailure, hash, Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rust_decimal::Decimal;

/// Ed25519 key pair for signing transfers
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Load from a PKCS#8 PEM private key
    pub fn from_private_key_pem(pem: &str) -> Result<Self> {
        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::Validation(format!("invalid private key: {}", e)))?;
        let verifying_key = signing_key.verifying_key();

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// PKCS#8 PEM private key (keep it secret)
    pub fn private_key_pem(&self) -> Result<String> {
        self.signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| Error::Validation(format!("cannot encode private key: {}", e)))
    }

    /// SPKI PEM public key, the form registered with the ledger
    pub fn public_key_pem(&self) -> Result<String> {
        self.verifying_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::Validation(format!("cannot encode public key: {}", e)))
    }

    /// Sign a message, returning base64
    pub fn sign(&self, message: &[u8]) -> String {
        STANDARD.encode(self.signing_key.sign(message).to_bytes())
    }

    /// Sign the canonical `sender|recipient|timestamp|amount` message
    pub fn sign_transfer(
        &self,
        sender: &str,
        recipient: &str,
        timestamp: &str,
        amount: &Decimal,
    ) -> String {
        let message = hash::signing_message(sender, recipient, timestamp, amount);
        self.sign(message.as_bytes())
    }
}

/// Parse an SPKI PEM ed25519 public key
pub fn parse_public_key(pem: &str) -> Result<VerifyingKey> {
    VerifyingKey::from_public_key_pem(pem.trim())
        .map_err(|e| Error::Validation(format!("invalid public key (PEM expected): {}", e)))
}

/// Verify a base64 signature over `message` with a PEM public key.
///
/// Any decoding problem counts as a failed verification.
pub fn verify_signature(message: &[u8], signature_b64: &str, public_key_pem: &str) -> bool {
    let verifying_key = match parse_public_key(public_key_pem) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let bytes = match STANDARD.decode(signature_b64.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let signature = match Signature::from_slice(&bytes) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    verifying_key.verify(message, &signature).is_ok()
}

/// Authenticate a transfer's claimed sender.
///
/// `public_key` is the sender's registered key, if any. Missing signature
/// is checked first, then unknown signer, then the signature itself.
pub fn check_transfer_signature(
    signature: Option<&str>,
    public_key: Option<&str>,
    message: &str,
) -> std::result::Result<(), SignatureFailure> {
    let signature = signature.ok_or(SignatureFailure::MissingSignature)?;
    let public_key = public_key.ok_or(SignatureFailure::UnknownSigner)?;

    if verify_signature(message.as_bytes(), signature, public_key) {
        Ok(())
    } else {
        Err(SignatureFailure::InvalidSignature)
    }
}
