//! Configuration management
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use std::fmt;

use rand::RngCore;
use thiserror::Error;

use crate::auth::{AuthSettings, VerificationMode};

/// Minimum signing secret length accepted in production
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Upper bound on token lifetime (30 days)
const MAX_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Where the token signing secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    Generated,
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Bind host
    pub host: String,

    /// Server port
    pub port: u16,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Token signing secret
    pub jwt_secret: String,

    pub jwt_secret_source: SecretSource,

    /// Optional password required alongside the signature
    pub wallet_password: Option<String>,

    /// Token TTL in seconds (default: 3600)
    pub token_ttl_seconds: i64,

    /// Accept logins without checking the signature
    pub skip_signature_verification: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &"****")
            .field("jwt_secret_source", &self.jwt_secret_source)
            .field(
                "wallet_password",
                &self.wallet_password.as_ref().map(|_| "****"),
            )
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field(
                "skip_signature_verification",
                &self.skip_signature_verification,
            )
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::from_str(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "5001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").filter(|s| !s.is_empty());

        let (jwt_secret, jwt_secret_source) = match lookup("JWT_SECRET").filter(|s| !s.is_empty())
        {
            Some(secret) => {
                if environment.is_production() && secret.len() < MIN_PRODUCTION_SECRET_LEN {
                    return Err(ConfigError::InvalidValue(format!(
                        "JWT_SECRET must be at least {} bytes in production",
                        MIN_PRODUCTION_SECRET_LEN
                    )));
                }
                (secret, SecretSource::Environment)
            }
            None if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()));
            }
            None => (generate_secret(), SecretSource::Generated),
        };

        let wallet_password = lookup("WALLET_PASSWORD").filter(|s| !s.is_empty());

        let token_ttl_seconds = lookup("TOKEN_TTL_SECONDS")
            .unwrap_or_else(|| "3600".to_string())
            .parse::<i64>()
            .ok()
            .filter(|ttl| (1..=MAX_TOKEN_TTL_SECONDS).contains(ttl))
            .ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "TOKEN_TTL_SECONDS must be between 1 and {}",
                    MAX_TOKEN_TTL_SECONDS
                ))
            })?;

        let skip_signature_verification = match lookup("SKIP_SIGNATURE_VERIFICATION") {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "SKIP_SIGNATURE_VERIFICATION must be true or false, got '{}'",
                    value
                ))
            })?,
            None => false,
        };

        if skip_signature_verification && environment.is_production() {
            return Err(ConfigError::InvalidValue(
                "SKIP_SIGNATURE_VERIFICATION cannot be enabled in production".to_string(),
            ));
        }

        Ok(Config {
            environment,
            host,
            port,
            cors_allowed_origins,
            jwt_secret,
            jwt_secret_source,
            wallet_password,
            token_ttl_seconds,
            skip_signature_verification,
        })
    }

    /// Protocol settings derived from this configuration
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            token_ttl_seconds: self.token_ttl_seconds,
            shared_secret: self.wallet_password.clone(),
            verification: if self.skip_signature_verification {
                VerificationMode::Disabled
            } else {
                VerificationMode::Enforced
            },
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Random per-process secret; tokens do not survive a restart.
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
