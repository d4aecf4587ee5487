//! JWT token issuance and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims carried by both access and refresh tokens.
///
/// The two token kinds are structurally identical; they differ only in the
/// validity window they are issued with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (member email)
    pub sub: String,
    /// Unique token ID. Timestamps have second granularity, so without this
    /// two tokens issued back-to-back for the same subject would be
    /// byte-identical and rotation could not tell old from new.
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Configuration for JWT operations.
///
/// Holds the process-wide signing key and the two validity windows. Built once
/// at startup and shared read-only across all request handlers.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and validity windows.
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Access token validity window.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh token validity window.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a short-lived access token for a subject.
    /// Access tokens are stateless; validity is signature + expiry only.
    pub fn issue_access_token(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, self.access_ttl)
    }

    /// Issue a refresh token for a subject.
    /// The authoritative copy is expected to be stored server-side by the caller.
    pub fn issue_refresh_token(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, self.refresh_ttl)
    }

    fn issue(&self, subject: &str, validity: Duration) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::Clock)?
            .as_secs();

        let claims = Claims {
            sub: subject.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + validity.as_secs(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Creation)
    }

    /// Validate a token and return its claims.
    ///
    /// The signature is verified before anything else; a tampered, malformed,
    /// or wrong-key token is `Invalid`. A structurally sound token whose
    /// signature verifies but whose expiry has passed is `Expired` -- a
    /// distinct outcome callers must not collapse into `Invalid`, since
    /// "log in again" and "corrupted/forged token" need different handling.
    ///
    /// The subject of a validated token is `claims.sub`; there is no way to
    /// read a subject out of a token without going through this check first.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry comparison is wall-clock with no grace window.
        validation.leeway = 0;

        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}

/// Errors that can occur during token operations.
#[derive(Debug)]
pub enum TokenError {
    /// Signature valid and well-formed, but past expiry.
    Expired,
    /// Malformed, tampered, or signed with a different key.
    Invalid,
    /// Error encoding a new token.
    Creation(jsonwebtoken::errors::Error),
    /// System clock is before the Unix epoch.
    Clock,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
            TokenError::Creation(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::Clock => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
