mod auth;
mod response;

use axum::Router;
use std::sync::Arc;

use crate::rate_limit::RateLimitConfig;
use crate::session::SessionService;

pub use response::ApiResponse;

/// Create the API router.
pub fn create_api_router(sessions: SessionService, secure_cookies: bool) -> Router {
    let auth_state = auth::AuthState {
        sessions,
        secure_cookies,
        rate_limits: Arc::new(RateLimitConfig::new()),
    };

    Router::new().nest("/auth", auth::router(auth_state))
}
