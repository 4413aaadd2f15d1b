//! Session token issuance and validation
//!
//! Tokens are HS256 JWTs binding a wallet address to an expiry instant. The
//! server keeps no session table: a token is valid if its MAC checks out under
//! the process signing secret and its expiry has not been reached.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{
    crypto, decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token expired")]
    Expired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Claims carried by a session token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Authenticated wallet address
    pub address: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly minted token and its validity window
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Mints and checks session tokens with the process-wide signing secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Create an issuer sealing tokens with `secret`
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Self::ALGORITHM);
        // Expiry is checked against the caller's clock in `decode`.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `address` valid from `now` until `now + ttl`
    ///
    /// `now` is truncated to whole seconds first.
    pub fn issue(
        &self,
        address: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        // Claims carry whole seconds; the reported instants must match them.
        let now = now.trunc_subsecs(0);
        let expires_at = now + ttl;
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            address: address.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            issued_at: now,
            expires_at,
        })
    }

    /// Verify a token and return its claims
    ///
    /// The MAC is checked over the raw `header.payload` text before anything is
    /// parsed, so a mutated token is always reported as a signature failure.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (message, signature) = token
            .rsplit_once('.')
            .filter(|(message, signature)| !message.is_empty() && !signature.is_empty())
            .ok_or_else(|| TokenError::Malformed("Missing signature segment".to_string()))?;

        let authentic = crypto::verify(
            signature,
            message.as_bytes(),
            &self.decoding_key,
            Self::ALGORITHM,
        )
        .map_err(|_| TokenError::InvalidSignature)?;

        if !authentic {
            return Err(TokenError::InvalidSignature);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Verify a token and return the address it was issued to
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        self.decode(token, now).map(|claims| claims.address)
    }
}
