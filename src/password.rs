//! Password hashing and verification.
//!
//! Argon2id with the crate's default parameters. Hashing and verification are
//! CPU-bound and deliberately slow; callers on the async request path should
//! run them on the blocking pool.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Hash a password with a freshly generated salt.
/// Returns the PHC-format hash string stored alongside the member record.
pub fn hash(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a presented password against a stored hash.
/// An unparsable stored hash counts as a mismatch rather than an error; the
/// caller cannot do anything more useful with it than reject the login.
pub fn verify(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
