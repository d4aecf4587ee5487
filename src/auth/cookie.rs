//! Refresh-token cookie handling.

use axum::http::header;
use std::time::Duration;

/// Cookie name for the refresh token (long-lived, rotated on every reissue).
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Build the Set-Cookie value for a refresh token.
///
/// HttpOnly keeps the long-lived credential away from page scripts;
/// SameSite=Strict stops it riding along on cross-site requests. The access
/// token is never a cookie -- it goes to the caller in the response body only.
pub fn build_refresh_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        REFRESH_COOKIE_NAME,
        token,
        max_age.as_secs(),
        if secure { "; Secure" } else { "" }
    )
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}
