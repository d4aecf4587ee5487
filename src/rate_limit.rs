//! Rate limiting for authentication endpoints.
//!
//! Per-IP token buckets in front of the credential-guessing surfaces. The
//! hash comparison is already slow on purpose; this keeps a single source from
//! hammering it anyway.

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Per-IP keyed limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for login attempts (10 per second)
    pub login: Arc<IpLimiter>,
    /// Per-IP limiter for signups (30 per minute)
    pub signup: Arc<IpLimiter>,
}

impl RateLimitConfig {
    /// Create rate limiters with default quotas.
    pub fn new() -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_second(
                NonZeroU32::new(10).unwrap(),
            ))),
            signup: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(30).unwrap(),
            ))),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => too_many_requests("Too many login attempts. Please wait before trying again."),
    }
}

/// Middleware for rate limiting signups.
pub async fn rate_limit_signup(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match config.signup.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => too_many_requests("Too many signup attempts. Please wait before trying again."),
    }
}

fn too_many_requests(message: &str) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({ "success": false, "message": message })),
    )
        .into_response()
}

/// Best-effort client IP: X-Forwarded-For (reverse proxy), then the socket
/// address. Requests with neither share one bucket.
fn client_ip(request: &Request) -> String {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first_ip) = value.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "local".to_string())
}
