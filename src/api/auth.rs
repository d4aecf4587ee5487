//! Authentication API endpoints.
//!
//! - POST `/login` - Verify credentials, issue a token pair, set refresh cookie
//! - POST `/reissue` - Rotate the refresh token, return a new access token
//! - POST `/signup` - Register a new member
//! - GET `/check-email` / `/check-nickname` - Duplicate-check predicates
//! - GET `/me` - Authenticated probe returning the resolved subject

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::response::ApiResponse;
use crate::auth::{CurrentMember, REFRESH_COOKIE_NAME, build_refresh_cookie, get_cookie};
use crate::db::Role;
use crate::error::AuthError;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_signup};
use crate::session::SessionService;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: SessionService,
    pub secure_cookies: bool,
    pub rate_limits: Arc<RateLimitConfig>,
}

pub fn router(state: AuthState) -> Router {
    let login_routes = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limits.clone(),
            rate_limit_login,
        ));

    let signup_routes = Router::new()
        .route("/signup", post(signup))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limits.clone(),
            rate_limit_signup,
        ));

    let open_routes = Router::new()
        .route("/reissue", post(reissue))
        .route("/check-email", get(check_email))
        .route("/check-nickname", get(check_nickname))
        .route("/me", get(me))
        .with_state(state);

    Router::new()
        .merge(login_routes)
        .merge(signup_routes)
        .merge(open_routes)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    access_token: String,
    nickname: String,
    role: Role,
}

async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let mut errors = Vec::new();
    validate_email(&payload.email, &mut errors);
    if payload.password.is_empty() {
        errors.push(("password", "Password must not be blank".to_string()));
    }
    if !errors.is_empty() {
        return Err(AuthError::InvalidInput(errors));
    }

    let outcome = state.sessions.login(&payload.email, &payload.password).await?;

    let cookie = build_refresh_cookie(
        &outcome.refresh_token,
        state.sessions.refresh_ttl(),
        state.secure_cookies,
    );

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(ApiResponse::success(LoginData {
            access_token: outcome.access_token,
            nickname: outcome.nickname,
            role: outcome.role,
        })),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReissueData {
    access_token: String,
}

async fn reissue(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE_NAME).ok_or_else(|| {
        AuthError::InvalidInput(vec![(
            "refreshToken",
            "Required cookie is missing".to_string(),
        )])
    })?;

    let outcome = state.sessions.reissue(refresh_token).await?;

    let cookie = build_refresh_cookie(
        &outcome.refresh_token,
        state.sessions.refresh_ttl(),
        state.secure_cookies,
    );

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(ApiResponse::success(ReissueData {
            access_token: outcome.access_token,
        })),
    ))
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    nickname: String,
}

async fn signup(
    State(state): State<AuthState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let mut errors = Vec::new();
    validate_email(&payload.email, &mut errors);
    if payload.password.len() < 8 {
        errors.push(("password", "Password must be at least 8 characters".to_string()));
    }
    let nickname = payload.nickname.trim();
    if nickname.is_empty() {
        errors.push(("nickname", "Nickname must not be blank".to_string()));
    } else if nickname.len() > 32 {
        errors.push(("nickname", "Nickname cannot be longer than 32 characters".to_string()));
    }
    if !errors.is_empty() {
        return Err(AuthError::InvalidInput(errors));
    }

    state
        .sessions
        .signup(&payload.email, &payload.password, nickname)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message_only("Signup complete")),
    ))
}

#[derive(Deserialize)]
struct CheckEmailParams {
    email: String,
}

/// Returns true if the email is already taken.
async fn check_email(
    State(state): State<AuthState>,
    Query(params): Query<CheckEmailParams>,
) -> Result<impl IntoResponse, AuthError> {
    let duplicate = state.sessions.is_email_duplicate(&params.email).await?;
    Ok(Json(ApiResponse::success(duplicate)))
}

#[derive(Deserialize)]
struct CheckNicknameParams {
    nickname: String,
}

/// Returns true if the nickname is already taken.
async fn check_nickname(
    State(state): State<AuthState>,
    Query(params): Query<CheckNicknameParams>,
) -> Result<impl IntoResponse, AuthError> {
    let duplicate = state.sessions.is_nickname_duplicate(&params.nickname).await?;
    Ok(Json(ApiResponse::success(duplicate)))
}

/// Authenticated probe: echoes the subject the middleware resolved.
async fn me(CurrentMember(context): CurrentMember) -> impl IntoResponse {
    Json(ApiResponse::success(context.subject))
}

fn validate_email(email: &str, errors: &mut Vec<(&'static str, String)>) {
    if email.is_empty() {
        errors.push(("email", "Email must not be blank".to_string()));
    } else if !email.contains('@') {
        errors.push(("email", "Email must be a valid address".to_string()));
    }
}
