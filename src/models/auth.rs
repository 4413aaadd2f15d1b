//! Authentication request/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{Challenge, Claims, Credential, IssuedToken};

/// Login request body
///
/// Every field is optional on the wire so that absent fields surface as
/// `MISSING_FIELD` instead of a body rejection.
#[derive(Deserialize, Default)]
pub struct LoginRequest {
    pub address: Option<String>,
    pub challenge: Option<String>,
    /// Hex-encoded signature over the challenge bytes
    pub signature: Option<String>,
    pub password: Option<String>,
}

impl From<LoginRequest> for Credential {
    fn from(req: LoginRequest) -> Self {
        Credential {
            address: req.address,
            challenge: req.challenge,
            signature: req.signature,
            password: req.password,
        }
    }
}

/// Successful login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

impl LoginResponse {
    pub fn authenticated(issued: IssuedToken) -> Self {
        Self {
            message: "Authenticated".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: (issued.expires_at - issued.issued_at).num_seconds(),
            expires_at: issued.expires_at,
            token: issued.token,
        }
    }
}

/// Request for a server-issued challenge
#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub address: String,
}

/// Response containing the challenge to sign
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub address: String,
    pub nonce: String,
    /// Exact text to sign and submit as `challenge`
    pub challenge: String,
    pub issued_at: DateTime<Utc>,
}

impl From<Challenge> for ChallengeResponse {
    fn from(challenge: Challenge) -> Self {
        Self {
            address: challenge.address,
            nonce: challenge.nonce,
            challenge: challenge.message,
            issued_at: challenge.issued_at,
        }
    }
}

/// Details of the session a bearer token represents
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub address: String,
    pub jti: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Claims> for SessionResponse {
    fn from(claims: Claims) -> Self {
        Self {
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            address: claims.address,
            jti: claims.jti,
        }
    }
}
