//! Wallet authentication
//!
//! Clients prove ownership of a keypair by signing a challenge; a valid
//! signature earns a short-lived bearer token.
//! - Address decoding (Stellar account IDs)
//! - Ed25519 signature verification
//! - Stateless JWT issuance and validation

mod address;
mod crypto;
mod jwt;
mod service;

pub use address::{AddressCodec, AddressError, PublicKeyBytes, StellarAddressCodec};
pub use crypto::{parse_signature, Ed25519Verifier, SignatureError, SignatureVerifier};
pub use jwt::{Claims, IssuedToken, TokenError, TokenIssuer};
pub use service::{
    AuthError, AuthResult, AuthService, AuthSettings, AuthStage, Challenge, Credential,
    VerificationMode, AUDIT_TARGET,
};
