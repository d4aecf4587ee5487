//! Business error taxonomy and its HTTP mapping.
//!
//! Every failure that can leave the service boundary is one of these variants,
//! each carrying a stable machine-checkable code alongside a human message.
//! Responses are always structured JSON; internal detail never reaches the
//! client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Authentication and membership errors.
#[derive(Debug)]
pub enum AuthError {
    /// No member registered under the presented login key.
    MemberNotFound,
    /// Member exists but the presented password does not match.
    LoginFailure,
    /// Signup attempted with an email that is already registered.
    EmailDuplication,
    /// Signup attempted with a nickname that is already taken.
    NicknameDuplication,
    /// Refresh token rejected: expired, tampered, superseded, or unknown.
    InvalidToken,
    /// Malformed request input; field name to message.
    InvalidInput(Vec<(&'static str, String)>),
    /// Unexpected failure; details stay in the logs.
    Internal,
}

impl AuthError {
    /// Log an unexpected failure and surface it as a generic internal error.
    pub fn internal(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        AuthError::Internal
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MemberNotFound => StatusCode::NOT_FOUND,
            AuthError::LoginFailure => StatusCode::BAD_REQUEST,
            AuthError::EmailDuplication | AuthError::NicknameDuplication => StatusCode::CONFLICT,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MemberNotFound => "MEMBER_NOT_FOUND",
            AuthError::LoginFailure => "LOGIN_FAILURE",
            AuthError::EmailDuplication => "EMAIL_DUPLICATION",
            AuthError::NicknameDuplication => "NICKNAME_DUPLICATION",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::InvalidInput(_) => "INVALID_INPUT_VALUE",
            AuthError::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MemberNotFound => "Member not found",
            AuthError::LoginFailure => "Login failed",
            AuthError::EmailDuplication => "Email is already in use",
            AuthError::NicknameDuplication => "Nickname is already in use",
            AuthError::InvalidToken => "Invalid token",
            AuthError::InvalidInput(_) => "Invalid input value",
            AuthError::Internal => "Internal server error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthError {}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    code: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let data = match &self {
            AuthError::InvalidInput(fields) => {
                let map: serde_json::Map<String, serde_json::Value> = fields
                    .iter()
                    .map(|(field, message)| ((*field).to_string(), message.clone().into()))
                    .collect();
                Some(serde_json::Value::Object(map))
            }
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            code: self.code(),
            message: self.message(),
            data,
        };

        (self.status(), Json(body)).into_response()
    }
}
