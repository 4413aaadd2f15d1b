//! Service banner and health check

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// GET / - Service banner
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Wallet authentication service is running",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "POST /auth/challenge",
            "POST /auth/login",
            "GET /auth/session",
            "GET /health",
        ],
    })
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub verification: &'static str,
    pub password_gate: bool,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        verification: state.auth_service.verification_mode().as_str(),
        password_gate: state.auth_service.password_required(),
    })
}
