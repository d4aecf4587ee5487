#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use gatehouse::db::{Database, Role};
use gatehouse::jwt::{Claims, JwtConfig};
use gatehouse::{ServerConfig, create_app};
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-for-testing-only";
pub const ACCESS_TTL: Duration = Duration::from_secs(1800);
pub const REFRESH_TTL: Duration = Duration::from_secs(3600);

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub jwt: JwtConfig,
}

/// Test app on an in-memory database, HTTP cookies (no Secure attribute).
pub async fn setup() -> TestApp {
    setup_with_options(false, ACCESS_TTL).await
}

pub async fn setup_with_options(secure_cookies: bool, access_ttl: Duration) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");

    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_SECRET.to_vec(),
        access_token_ttl: access_ttl,
        refresh_token_ttl: REFRESH_TTL,
        secure_cookies,
    };

    TestApp {
        app: create_app(&config),
        db,
        jwt: JwtConfig::new(TEST_SECRET, access_ttl, REFRESH_TTL),
    }
}

/// Seed a member directly, bypassing the signup endpoint.
pub async fn seed_member(db: &Database, email: &str, password: &str, nickname: &str, role: Role) {
    let hash = gatehouse::password::hash(password).expect("Failed to hash password");
    db.members()
        .create(email, &hash, nickname, role)
        .await
        .expect("Failed to seed member");
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get_with_bearer(app: &Router, uri: &str, token: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn login(app: &Router, email: &str, password: &str) -> Response<Body> {
    post_json(
        app,
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await
}

pub async fn reissue_with_cookie(app: &Router, refresh_token: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/reissue")
                .header("cookie", format!("refreshToken={}", refresh_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("Body is not JSON: {}", e))
}

/// Extract Set-Cookie headers from response.
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Pull the refresh token value out of Set-Cookie headers.
pub fn refresh_cookie_value(cookies: &[String]) -> Option<String> {
    cookies
        .iter()
        .find(|c| c.starts_with("refreshToken="))
        .and_then(|c| c.split(';').next())
        .and_then(|kv| kv.split_once('='))
        .map(|(_, value)| value.to_string())
}

/// Encode arbitrary claims under the test secret, bypassing the issue path.
/// Lets tests craft already-expired tokens without waiting for wall clock.
pub fn encode_claims(claims: &Claims) -> String {
    let key = jsonwebtoken::EncodingKey::from_secret(TEST_SECRET);
    jsonwebtoken::encode(&jsonwebtoken::Header::default(), claims, &key).unwrap()
}

/// A token signed with the test secret whose expiry is an hour in the past.
pub fn expired_token(subject: &str) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    encode_claims(&Claims {
        sub: subject.to_string(),
        jti: "test-jti".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    })
}

/// Replace the final character with a different canonical base64url character,
/// corrupting the signature while keeping the token decodable in shape.
pub fn tamper_last_char(token: &str) -> String {
    let mut tampered: String = token[..token.len() - 1].to_string();
    tampered.push(if token.ends_with('A') { 'Q' } else { 'A' });
    tampered
}
