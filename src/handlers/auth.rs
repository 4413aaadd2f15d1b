//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based authentication.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;

use super::AuthenticatedWallet;
use crate::error::ApiError;
use crate::models::{
    ChallengeRequest, ChallengeResponse, LoginRequest, LoginResponse, SessionResponse,
};
use crate::state::AppState;

/// POST /auth/challenge - Get a message to sign
pub async fn request_challenge(
    State(state): State<AppState>,
    payload: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let challenge = state
        .auth_service
        .issue_challenge(&req.address, Utc::now())?;

    Ok(Json(challenge.into()))
}

/// POST /auth/login - Verify a signed challenge and issue a token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let issued = state.auth_service.authenticate(req.into())?;

    Ok(Json(LoginResponse::authenticated(issued)))
}

/// GET /auth/session - Describe the session behind a bearer token
pub async fn get_session(wallet: AuthenticatedWallet) -> Json<SessionResponse> {
    Json(wallet.claims.into())
}
