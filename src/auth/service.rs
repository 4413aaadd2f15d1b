//! Authentication service
//!
//! Runs the challenge-response protocol: presence checks, the optional
//! password gate, address decoding, signature verification and token issuance.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::address::{AddressCodec, AddressError, PublicKeyBytes, StellarAddressCodec};
use super::crypto::{Ed25519Verifier, SignatureError, SignatureVerifier};
use super::jwt::{Claims, IssuedToken, TokenError, TokenIssuer};

/// Log target for per-request authentication outcomes
pub const AUDIT_TARGET: &str = "auth_audit";

/// Auth service errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid password")]
    InvalidCredentialSecret,

    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidTokenSignature,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingField(_) => "MISSING_FIELD",
            AuthError::InvalidCredentialSecret => "INVALID_CREDENTIAL_SECRET",
            AuthError::InvalidAddress(_) => "INVALID_ADDRESS",
            AuthError::MalformedSignature(_) => "MALFORMED_SIGNATURE",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::ExpiredToken => "EXPIRED_TOKEN",
            AuthError::InvalidTokenSignature => "INVALID_TOKEN_SIGNATURE",
            AuthError::MalformedToken(_) => "MALFORMED_TOKEN",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AddressError> for AuthError {
    fn from(e: AddressError) -> Self {
        AuthError::InvalidAddress(e.to_string())
    }
}

impl From<SignatureError> for AuthError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::Malformed(reason) => AuthError::MalformedSignature(reason),
            SignatureError::InvalidPublicKey(reason) => AuthError::InvalidAddress(reason),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::InvalidSignature => AuthError::InvalidTokenSignature,
            TokenError::Malformed(reason) => AuthError::MalformedToken(reason),
            TokenError::EncodingFailed(reason) => AuthError::Internal(reason),
        }
    }
}

/// Outcome of one authentication attempt
pub type AuthResult = Result<IssuedToken, AuthError>;

/// Progress of a single login request through the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    Received,
    AddressDecoded,
    SignatureChecked,
    TokenIssued,
}

impl AuthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStage::Received => "received",
            AuthStage::AddressDecoded => "address_decoded",
            AuthStage::SignatureChecked => "signature_checked",
            AuthStage::TokenIssued => "token_issued",
        }
    }
}

/// Whether signatures are actually checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationMode {
    #[default]
    Enforced,
    /// Accepts any signature. Never allowed in production.
    Disabled,
}

impl VerificationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMode::Enforced => "enforced",
            VerificationMode::Disabled => "disabled",
        }
    }
}

/// One login attempt as submitted by a client. Consumed by
/// [`AuthService::authenticate`] and never stored.
#[derive(Default)]
pub struct Credential {
    pub address: Option<String>,
    pub challenge: Option<String>,
    pub signature: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("challenge", &self.challenge)
            .finish_non_exhaustive()
    }
}

/// A server-issued challenge for a client to sign
#[derive(Debug, Clone)]
pub struct Challenge {
    pub address: String,
    pub nonce: String,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

/// Configured password gate; only the digest of the expected value is kept.
#[derive(Clone)]
struct SharedSecret {
    digest: [u8; 32],
}

impl SharedSecret {
    fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    /// Constant-time comparison of digests
    fn matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        self.digest
            .iter()
            .zip(candidate.iter())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

/// Protocol policy knobs
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub token_ttl_seconds: i64,
    pub shared_secret: Option<String>,
    pub verification: VerificationMode,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_seconds: 3600,
            shared_secret: None,
            verification: VerificationMode::Enforced,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    codec: Arc<dyn AddressCodec>,
    verifier: Arc<dyn SignatureVerifier>,
    issuer: TokenIssuer,
    shared_secret: Option<SharedSecret>,
    verification: VerificationMode,
    token_ttl: Duration,
}

impl AuthService {
    /// Create a service for Stellar addresses and ed25519 signatures
    pub fn new(issuer: TokenIssuer, settings: AuthSettings) -> Self {
        if settings.verification == VerificationMode::Disabled {
            tracing::warn!(
                target: AUDIT_TARGET,
                "Signature verification is DISABLED; any signature will be accepted"
            );
        }

        Self {
            codec: Arc::new(StellarAddressCodec),
            verifier: Arc::new(Ed25519Verifier),
            issuer,
            shared_secret: settings.shared_secret.as_deref().map(SharedSecret::new),
            verification: settings.verification,
            token_ttl: Duration::seconds(settings.token_ttl_seconds),
        }
    }

    /// Swap the address format
    pub fn with_codec(mut self, codec: Arc<dyn AddressCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Swap the signature scheme
    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn verification_mode(&self) -> VerificationMode {
        self.verification
    }

    pub fn password_required(&self) -> bool {
        self.shared_secret.is_some()
    }

    /// Verify a credential and issue a token, using the current time
    pub fn authenticate(&self, credential: Credential) -> AuthResult {
        self.authenticate_at(credential, Utc::now())
    }

    /// Verify a credential and issue a token valid from `now`
    pub fn authenticate_at(&self, credential: Credential, now: DateTime<Utc>) -> AuthResult {
        let mut stage = AuthStage::Received;
        let address = credential.address.clone();

        match self.run_protocol(credential, now, &mut stage) {
            Ok(issued) => {
                tracing::info!(
                    target: AUDIT_TARGET,
                    address = address.as_deref().unwrap_or_default(),
                    jti = %issued.jti,
                    expires_at = %issued.expires_at,
                    verification = self.verification.as_str(),
                    "Authentication succeeded"
                );
                Ok(issued)
            }
            Err(AuthError::Internal(detail)) => {
                tracing::error!(
                    target: AUDIT_TARGET,
                    address = address.as_deref().unwrap_or_default(),
                    stage = stage.as_str(),
                    error = %detail,
                    "Authentication failed with an internal error"
                );
                Err(AuthError::Internal(detail))
            }
            Err(e) => {
                tracing::warn!(
                    target: AUDIT_TARGET,
                    address = address.as_deref().unwrap_or_default(),
                    stage = stage.as_str(),
                    code = e.code(),
                    reason = %e,
                    "Authentication rejected"
                );
                Err(e)
            }
        }
    }

    fn run_protocol(
        &self,
        credential: Credential,
        now: DateTime<Utc>,
        stage: &mut AuthStage,
    ) -> AuthResult {
        let address = required(credential.address, "address")?;
        let challenge = required(credential.challenge, "challenge")?;
        let signature = required(credential.signature, "signature")?;

        if let Some(secret) = &self.shared_secret {
            let password = required(credential.password, "password")?;
            if !secret.matches(&password) {
                return Err(AuthError::InvalidCredentialSecret);
            }
        }

        let public_key = self.decode_address(&address)?;
        *stage = AuthStage::AddressDecoded;

        match self.verification {
            VerificationMode::Enforced => {
                if !self
                    .verifier
                    .verify(&public_key, challenge.as_bytes(), &signature)?
                {
                    return Err(AuthError::InvalidSignature);
                }
            }
            VerificationMode::Disabled => {
                tracing::warn!(
                    target: AUDIT_TARGET,
                    address = %address,
                    "Signature verification bypassed by configuration"
                );
            }
        }
        *stage = AuthStage::SignatureChecked;

        let issued = self.issuer.issue(&address, now, self.token_ttl)?;
        *stage = AuthStage::TokenIssued;

        Ok(issued)
    }

    /// Decode `address` and confirm its key is usable by the verifier.
    ///
    /// Runs in both verification modes, so an address whose key can never
    /// sign is refused before any signature handling.
    fn decode_address(&self, address: &str) -> Result<PublicKeyBytes, AuthError> {
        let public_key = self.codec.decode(address)?;
        self.verifier.check_public_key(&public_key)?;
        Ok(public_key)
    }

    /// Check a token and return the address it is bound to
    pub fn validate_token(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        Ok(self.issuer.validate(token, now)?)
    }

    /// Check a token and return its full claim set
    pub fn token_claims(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        Ok(self.issuer.decode(token, now)?)
    }

    /// Build a challenge for `address` to sign
    ///
    /// Nothing is stored; the client submits the message text back as its
    /// challenge in the login request.
    pub fn issue_challenge(
        &self,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<Challenge, AuthError> {
        if address.is_empty() {
            return Err(AuthError::MissingField("address"));
        }
        self.decode_address(address)?;

        let nonce = generate_secure_nonce();
        let message = format!(
            "Sign this message to authenticate:\n\nNonce: {}\nWallet: {}\nIssued: {}",
            nonce,
            address,
            now.format("%Y-%m-%d %H:%M:%S UTC")
        );

        Ok(Challenge {
            address: address.to_string(),
            nonce,
            message,
            issued_at: now,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AuthError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingField(field))
}

/// Generate a cryptographically secure nonce
fn generate_secure_nonce() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
