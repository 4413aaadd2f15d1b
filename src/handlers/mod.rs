//! API handlers

pub mod auth;
pub mod health;

pub use auth::*;
pub use health::{health_check, root};

// Re-export the token extractor for handler use
pub use crate::middleware::auth::AuthenticatedWallet;
