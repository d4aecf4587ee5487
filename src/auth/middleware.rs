//! Request-time access-token validation.
//!
//! One middleware pass per request. A missing or non-Bearer Authorization
//! header leaves the request anonymous and lets it through -- whether that is
//! acceptable is decided downstream by the [`CurrentMember`] extractor. A
//! present token that fails validation short-circuits the chain right here
//! with a 401 JSON body; downstream handlers never see the request.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::jwt::{JwtConfig, TokenError};

/// Identity attached to a request after successful bearer validation.
/// Carries the subject only; role/authority checks are not this layer's job.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject: String,
}

/// Middleware validating the `Authorization: Bearer` header.
///
/// Expired and invalid tokens get distinct messages behind the same 401
/// status: clients need to know whether to re-login or to treat the token as
/// corrupted.
pub async fn authenticate(
    State(jwt): State<Arc<JwtConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    // At most one pass per request, even if the layer is applied twice.
    if request.extensions().get::<AuthContext>().is_some() {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()) else {
        return next.run(request).await;
    };

    match jwt.validate(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthContext {
                subject: claims.sub,
            });
            next.run(request).await
        }
        Err(TokenError::Expired) => reject("AccessToken has expired"),
        Err(_) => reject("Invalid token"),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn reject(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "success": false, "message": message })),
    )
        .into_response()
}

/// Extractor for handlers that require an authenticated caller.
/// Reads the identity the middleware attached; absent means the request was
/// anonymous and gets a 401.
pub struct CurrentMember(pub AuthContext);

impl<S> FromRequestParts<S> for CurrentMember
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentMember)
            .ok_or_else(|| reject("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn test_missing_header_is_none() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_non_bearer_scheme_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        // Case-sensitive prefix, like the scheme the clients are told to send.
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer abc"),
        );
        assert_eq!(bearer_token(&headers), None);
    }
}
