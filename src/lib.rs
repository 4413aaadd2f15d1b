//! Wallet authentication service
//!
//! Clients prove they hold the private key behind a public wallet address by
//! signing a challenge, and receive a time-bounded bearer token in return.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
