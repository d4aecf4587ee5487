//! Session lifecycle orchestration: login, token reissue, and signup.
//!
//! Composes the token codec, the refresh-token store, and the member store.
//! Holds no state of its own beyond shared handles; all session truth lives in
//! the refresh-token store, so any number of instances can serve requests
//! concurrently.

use std::sync::Arc;
use std::time::Duration;

use crate::db::{Database, Role};
use crate::error::AuthError;
use crate::jwt::JwtConfig;
use crate::password;

#[derive(Clone)]
pub struct SessionService {
    db: Database,
    jwt: Arc<JwtConfig>,
}

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub nickname: String,
    pub role: Role,
}

/// Result of a successful token reissue.
/// Profile fields are deliberately not re-fetched here.
#[derive(Debug)]
pub struct ReissueOutcome {
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionService {
    pub fn new(db: Database, jwt: Arc<JwtConfig>) -> Self {
        Self { db, jwt }
    }

    /// Refresh token validity, used for the cookie Max-Age.
    pub fn refresh_ttl(&self) -> Duration {
        self.jwt.refresh_ttl()
    }

    /// Authenticate a member and issue a fresh token pair.
    ///
    /// The refresh token is persisted before this returns: a client reissue
    /// arriving right after the response must find the record in place.
    pub async fn login(&self, email: &str, presented: &str) -> Result<LoginOutcome, AuthError> {
        let member = self
            .db
            .members()
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::internal("Failed to look up member", e))?
            .ok_or(AuthError::MemberNotFound)?;

        let password = presented.to_string();
        let stored_hash = member.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || password::verify(&password, &stored_hash))
            .await
            .map_err(|e| AuthError::internal("Password verification task failed", e))?;
        if !verified {
            return Err(AuthError::LoginFailure);
        }

        let access_token = self
            .jwt
            .issue_access_token(&member.email)
            .map_err(|e| AuthError::internal("Failed to issue access token", e))?;
        let refresh_token = self
            .jwt
            .issue_refresh_token(&member.email)
            .map_err(|e| AuthError::internal("Failed to issue refresh token", e))?;

        // Overwrites any previous record: at most one refresh token is valid
        // per identity at any time.
        self.db
            .refresh_tokens()
            .put(&member.email, &refresh_token, self.jwt.refresh_ttl())
            .await
            .map_err(|e| AuthError::internal("Failed to store refresh token", e))?;

        Ok(LoginOutcome {
            access_token,
            refresh_token,
            nickname: member.nickname,
            role: member.role,
        })
    }

    /// Exchange a refresh token for a new token pair, rotating the stored
    /// record.
    ///
    /// Expired and invalid presented tokens both report `InvalidToken` here,
    /// unlike the access-token middleware which keeps the two outcomes
    /// distinct.
    pub async fn reissue(&self, presented: &str) -> Result<ReissueOutcome, AuthError> {
        let claims = self
            .jwt
            .validate(presented)
            .map_err(|_| AuthError::InvalidToken)?;

        let access_token = self
            .jwt
            .issue_access_token(&claims.sub)
            .map_err(|e| AuthError::internal("Failed to issue access token", e))?;
        let refresh_token = self
            .jwt
            .issue_refresh_token(&claims.sub)
            .map_err(|e| AuthError::internal("Failed to issue refresh token", e))?;

        // The compare against the stored value and the overwrite are a single
        // conditional update. A superseded token no longer matches the stored
        // value and is rejected even though its signature and expiry still
        // check out; a successful swap is what invalidates the presented token
        // for every future attempt.
        let rotated = self
            .db
            .refresh_tokens()
            .swap_if_matches(&claims.sub, presented, &refresh_token, self.jwt.refresh_ttl())
            .await
            .map_err(|e| AuthError::internal("Failed to rotate refresh token", e))?;
        if !rotated {
            return Err(AuthError::InvalidToken);
        }

        Ok(ReissueOutcome {
            access_token,
            refresh_token,
        })
    }

    /// Register a new member with a hashed password and the default role.
    /// Email uniqueness is checked first, then nickname; first failure wins.
    pub async fn signup(
        &self,
        email: &str,
        presented: &str,
        nickname: &str,
    ) -> Result<(), AuthError> {
        if self
            .db
            .members()
            .exists_by_email(email)
            .await
            .map_err(|e| AuthError::internal("Failed to check email", e))?
        {
            return Err(AuthError::EmailDuplication);
        }

        if self
            .db
            .members()
            .exists_by_nickname(nickname)
            .await
            .map_err(|e| AuthError::internal("Failed to check nickname", e))?
        {
            return Err(AuthError::NicknameDuplication);
        }

        let password = presented.to_string();
        let hash = tokio::task::spawn_blocking(move || password::hash(&password))
            .await
            .map_err(|e| AuthError::internal("Password hashing task failed", e))?
            .map_err(|e| AuthError::internal("Failed to hash password", e))?;

        self.db
            .members()
            .create(email, &hash, nickname, Role::User)
            .await
            .map_err(|e| AuthError::internal("Failed to create member", e))?;

        Ok(())
    }

    /// Whether an email is already registered. No side effects.
    pub async fn is_email_duplicate(&self, email: &str) -> Result<bool, AuthError> {
        self.db
            .members()
            .exists_by_email(email)
            .await
            .map_err(|e| AuthError::internal("Failed to check email", e))
    }

    /// Whether a nickname is already taken. No side effects.
    pub async fn is_nickname_duplicate(&self, nickname: &str) -> Result<bool, AuthError> {
        self.db
            .members()
            .exists_by_nickname(nickname)
            .await
            .map_err(|e| AuthError::internal("Failed to check nickname", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-testing";

    async fn test_service() -> SessionService {
        let db = Database::open(":memory:").await.unwrap();
        let jwt = Arc::new(JwtConfig::new(
            SECRET,
            Duration::from_secs(1800),
            Duration::from_secs(3600),
        ));
        SessionService::new(db, jwt)
    }

    async fn seed(service: &SessionService, email: &str, password: &str, nickname: &str) {
        service.signup(email, password, nickname).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_happy_path() {
        let service = test_service().await;
        seed(&service, "alice@test.com", "pw-alice", "alice").await;

        let outcome = service.login("alice@test.com", "pw-alice").await.unwrap();
        assert!(!outcome.access_token.is_empty());
        assert!(!outcome.refresh_token.is_empty());
        assert_eq!(outcome.nickname, "alice");
        assert_eq!(outcome.role, Role::User);

        // The authoritative copy is in place before login returns.
        let stored = service
            .db
            .refresh_tokens()
            .get("alice@test.com")
            .await
            .unwrap();
        assert_eq!(stored, Some(outcome.refresh_token));
    }

    #[tokio::test]
    async fn test_login_unknown_member() {
        let service = test_service().await;
        let err = service.login("ghost@test.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::MemberNotFound));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = test_service().await;
        seed(&service, "alice@test.com", "pw-alice", "alice").await;

        let err = service.login("alice@test.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::LoginFailure));
    }

    #[tokio::test]
    async fn test_login_overwrites_previous_session() {
        let service = test_service().await;
        seed(&service, "alice@test.com", "pw-alice", "alice").await;

        let first = service.login("alice@test.com", "pw-alice").await.unwrap();
        let second = service.login("alice@test.com", "pw-alice").await.unwrap();

        // Only the second refresh token is still reissuable.
        assert!(matches!(
            service.reissue(&first.refresh_token).await.unwrap_err(),
            AuthError::InvalidToken
        ));
        service.reissue(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_reissue_rotates_and_rejects_replay() {
        let service = test_service().await;
        seed(&service, "alice@test.com", "pw-alice", "alice").await;
        let login = service.login("alice@test.com", "pw-alice").await.unwrap();

        let reissued = service.reissue(&login.refresh_token).await.unwrap();
        assert!(!reissued.access_token.is_empty());
        assert_ne!(reissued.refresh_token, login.refresh_token);

        // The superseded token still has a valid signature and expiry, but it
        // is no longer the stored value.
        let err = service.reissue(&login.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        // The rotated token works.
        service.reissue(&reissued.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_reissue_rejects_token_absent_from_store() {
        let service = test_service().await;
        seed(&service, "alice@test.com", "pw-alice", "alice").await;

        // Signed and unexpired, but never persisted (no login happened).
        let orphan = service.jwt.issue_refresh_token("alice@test.com").unwrap();
        let err = service.reissue(&orphan).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_reissue_rejects_garbage() {
        let service = test_service().await;
        let err = service.reissue("not-a-token").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_signup_duplicate_checks_in_order() {
        let service = test_service().await;
        seed(&service, "alice@test.com", "pw-alice", "alice").await;

        // Same email and same nickname: the email check fires first.
        let err = service
            .signup("alice@test.com", "pw", "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailDuplication));

        let err = service
            .signup("alice2@test.com", "pw", "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NicknameDuplication));
    }

    #[tokio::test]
    async fn test_duplicate_predicates() {
        let service = test_service().await;
        seed(&service, "alice@test.com", "pw-alice", "alice").await;

        assert!(service.is_email_duplicate("alice@test.com").await.unwrap());
        assert!(!service.is_email_duplicate("bob@test.com").await.unwrap());
        assert!(service.is_nickname_duplicate("alice").await.unwrap());
        assert!(!service.is_nickname_duplicate("bob").await.unwrap());
    }
}
