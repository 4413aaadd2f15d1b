//! Request and response models

mod auth;

pub use auth::*;
