//! Wallet signature verification
//!
//! Verifies ed25519 signatures over the exact challenge bytes a client signed.

use ed25519_dalek::{Signature, Verifier, VerifyingKey, SIGNATURE_LENGTH};
use thiserror::Error;

use super::address::PublicKeyBytes;

/// Errors raised before a signature can be checked at all
///
/// A well-formed signature that does not verify is not an error; see
/// [`SignatureVerifier::verify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid signature format: {0}")]
    Malformed(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Checks a signature produced by the private half of `public_key`.
pub trait SignatureVerifier: Send + Sync {
    /// Rejects key bytes that cannot belong to any keypair of the scheme.
    fn check_public_key(&self, public_key: &PublicKeyBytes) -> Result<(), SignatureError>;

    /// Returns `Ok(false)` for a well-formed signature that does not match.
    ///
    /// `message` is used as-is; no prefixing, wrapping or hashing is applied
    /// beyond what the scheme itself defines.
    fn verify(
        &self,
        public_key: &PublicKeyBytes,
        message: &[u8],
        signature: &str,
    ) -> Result<bool, SignatureError>;
}

/// Ed25519 verification of hex-encoded signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    fn verifying_key(public_key: &PublicKeyBytes) -> Result<VerifyingKey, SignatureError> {
        VerifyingKey::from_bytes(public_key)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn check_public_key(&self, public_key: &PublicKeyBytes) -> Result<(), SignatureError> {
        Self::verifying_key(public_key).map(|_| ())
    }

    fn verify(
        &self,
        public_key: &PublicKeyBytes,
        message: &[u8],
        signature: &str,
    ) -> Result<bool, SignatureError> {
        let verifying_key = Self::verifying_key(public_key)?;
        let signature = parse_signature(signature)?;

        Ok(verifying_key.verify(message, &signature).is_ok())
    }
}

/// Parse a hex signature, with or without a `0x` prefix.
pub fn parse_signature(encoded: &str) -> Result<Signature, SignatureError> {
    let trimmed = encoded.trim();
    let hex_digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_digits.len() != SIGNATURE_LENGTH * 2 {
        return Err(SignatureError::Malformed(format!(
            "Expected {} hex characters, got {}",
            SIGNATURE_LENGTH * 2,
            hex_digits.len()
        )));
    }

    let mut bytes = [0u8; SIGNATURE_LENGTH];
    hex::decode_to_slice(hex_digits, &mut bytes)
        .map_err(|e| SignatureError::Malformed(e.to_string()))?;

    Ok(Signature::from_bytes(&bytes))
}
