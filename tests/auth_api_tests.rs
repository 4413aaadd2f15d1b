//! End-to-end tests of the login API through the axum router

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use tower::ServiceExt;

use wallet_auth_server::auth::{
    AddressCodec, AuthService, AuthSettings, StellarAddressCodec, TokenIssuer, VerificationMode,
};
use wallet_auth_server::routes::create_router;
use wallet_auth_server::state::AppState;

const SECRET: &[u8] = b"integration-test-signing-secret!!";

fn app_with(settings: AuthSettings) -> (Router, Arc<AuthService>) {
    let service = Arc::new(AuthService::new(TokenIssuer::new(SECRET), settings));
    let router = create_router(AppState::new(service.clone()), None);
    (router, service)
}

fn app() -> (Router, Arc<AuthService>) {
    app_with(AuthSettings::default())
}

fn keypair(seed: u8) -> (SigningKey, String) {
    let key = SigningKey::from_bytes(&[seed; 32]);
    let address = StellarAddressCodec.encode(&key.verifying_key().to_bytes());
    (key, address)
}

fn sign(key: &SigningKey, challenge: &str) -> String {
    hex::encode(key.sign(challenge.as_bytes()).to_bytes())
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(router, request).await
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn login_with_valid_signature_returns_token() {
    let (router, service) = app();
    let (key, address) = keypair(1);

    let (status, body) = post_json(
        router,
        "/auth/login",
        json!({
            "address": address,
            "challenge": "login-42",
            "signature": sign(&key, "login-42"),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Authenticated");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let token = body["token"].as_str().unwrap();
    assert_eq!(service.validate_token(token, Utc::now()).unwrap(), address);
}

#[tokio::test]
async fn login_signed_by_other_key_is_forbidden() {
    let (router, _) = app();
    let (_, address_a) = keypair(1);
    let (key_b, _) = keypair(2);

    let (status, body) = post_json(
        router,
        "/auth/login",
        json!({
            "address": address_a,
            "challenge": "login-42",
            "signature": sign(&key_b, "login-42"),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "INVALID_SIGNATURE");
}

#[tokio::test]
async fn malformed_signature_is_reported_separately() {
    let (router, _) = app();
    let (_, address) = keypair(3);

    let (status, body) = post_json(
        router,
        "/auth/login",
        json!({
            "address": address,
            "challenge": "login-42",
            "signature": "xyz-not-hex",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "MALFORMED_SIGNATURE");
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let (key, address) = keypair(4);
    let signature = sign(&key, "login");

    let bodies = [
        json!({ "challenge": "login", "signature": signature }),
        json!({ "address": address, "signature": signature }),
        json!({ "address": address, "challenge": "login" }),
        json!({ "address": "", "challenge": "login", "signature": signature }),
        json!({}),
    ];

    for body in bodies {
        let (router, _) = app();
        let (status, response) = post_json(router, "/auth/login", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&response), "MISSING_FIELD");
    }
}

#[tokio::test]
async fn invalid_address_is_forbidden() {
    let (router, _) = app();

    let (status, body) = post_json(
        router,
        "/auth/login",
        json!({
            "address": "not-a-valid-address",
            "challenge": "login",
            "signature": "00".repeat(64),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "INVALID_ADDRESS");
}

#[tokio::test]
async fn off_curve_address_is_forbidden_even_without_verification() {
    let mut key = [0u8; 32];
    key[0] = 3;
    key[1] = 7;
    let address = StellarAddressCodec.encode(&key);

    for verification in [VerificationMode::Enforced, VerificationMode::Disabled] {
        let (router, _) = app_with(AuthSettings {
            verification,
            ..AuthSettings::default()
        });
        let (status, body) = post_json(
            router,
            "/auth/login",
            json!({ "address": address, "challenge": "login", "signature": "zz" }),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), "INVALID_ADDRESS");
    }
}

#[tokio::test]
async fn unparseable_body_is_bad_request() {
    let (router, _) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");
}

#[tokio::test]
async fn password_gate_rejects_wrong_password() {
    let settings = AuthSettings {
        shared_secret: Some("open-sesame".to_string()),
        ..AuthSettings::default()
    };
    let (key, address) = keypair(5);
    let signature = sign(&key, "login");

    let (router, _) = app_with(settings.clone());
    let (status, body) = post_json(
        router,
        "/auth/login",
        json!({
            "address": address,
            "challenge": "login",
            "signature": signature,
            "password": "wrong",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_CREDENTIAL_SECRET");

    let (router, _) = app_with(settings.clone());
    let (status, body) = post_json(
        router,
        "/auth/login",
        json!({ "address": address, "challenge": "login", "signature": signature }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "MISSING_FIELD");

    let (router, _) = app_with(settings);
    let (status, _) = post_json(
        router,
        "/auth/login",
        json!({
            "address": address,
            "challenge": "login",
            "signature": signature,
            "password": "open-sesame",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn verification_bypass_accepts_any_signature() {
    let (router, _) = app_with(AuthSettings {
        verification: VerificationMode::Disabled,
        ..AuthSettings::default()
    });
    let (_, address) = keypair(6);

    let (status, body) = post_json(
        router,
        "/auth/login",
        json!({ "address": address, "challenge": "login", "signature": "unchecked" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn challenge_then_login_then_session() {
    let (key, address) = keypair(7);

    let (router, _) = app();
    let (status, challenge) =
        post_json(router, "/auth/challenge", json!({ "address": address })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(challenge["address"], address);

    let message = challenge["challenge"].as_str().unwrap().to_string();
    assert!(message.contains(challenge["nonce"].as_str().unwrap()));

    let (router, service) = app();
    let (status, login) = post_json(
        router,
        "/auth/login",
        json!({
            "address": address,
            "challenge": message,
            "signature": sign(&key, &message),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap();

    let router = create_router(AppState::new(service), None);
    let request = Request::builder()
        .uri("/auth/session")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, session) = send(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["address"], address);
    assert!(session["expires_at"].is_string());
}

#[tokio::test]
async fn challenge_for_bad_address_is_forbidden() {
    let (router, _) = app();
    let (status, body) =
        post_json(router, "/auth/challenge", json!({ "address": "GBOGUS" })).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "INVALID_ADDRESS");
}

#[tokio::test]
async fn session_requires_valid_bearer_token() {
    let (router, _) = app();
    let request = Request::builder()
        .uri("/auth/session")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (router, _) = app();
    let request = Request::builder()
        .uri("/auth/session")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "MALFORMED_TOKEN");
}

#[tokio::test]
async fn session_rejects_token_from_other_secret() {
    let (_, address) = keypair(8);
    let foreign = TokenIssuer::new(b"some-other-secret")
        .issue(&address, Utc::now(), chrono::Duration::seconds(3600))
        .unwrap();

    let (router, _) = app();
    let request = Request::builder()
        .uri("/auth/session")
        .header(header::AUTHORIZATION, format!("Bearer {}", foreign.token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_TOKEN_SIGNATURE");
}

#[tokio::test]
async fn session_rejects_expired_token() {
    let (_, address) = keypair(9);
    let stale = TokenIssuer::new(SECRET)
        .issue(
            &address,
            Utc::now() - chrono::Duration::hours(2),
            chrono::Duration::seconds(3600),
        )
        .unwrap();

    let (router, _) = app();
    let request = Request::builder()
        .uri("/auth/session")
        .header(header::AUTHORIZATION, format!("Bearer {}", stale.token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "EXPIRED_TOKEN");
}

#[tokio::test]
async fn health_and_banner() {
    let (router, _) = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["verification"], "enforced");
    assert_eq!(body["password_gate"], false);

    let (router, _) = app();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let (router, _) = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
}
