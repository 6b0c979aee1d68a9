//! Password hashing, bearer tokens and the role capabilities handed to handlers.

use std::num::NonZeroU32;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use thiserror::Error;

use crate::storage::models::Role;

static PBKDF2_ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid stored credential: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("Iteration count must be greater than 0")]
    Iterations,
    #[error("Secure random generator failed")]
    Random,
}

/// Base64-encoded PBKDF2 output and salt.
#[derive(Debug, Clone)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
    pub iterations: u32,
}

pub fn hash_password(password: &str, iterations: u32) -> Result<PasswordHash, AuthError> {
    let rounds = NonZeroU32::new(iterations).ok_or(AuthError::Iterations)?;

    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| AuthError::Random)?;

    let mut credential = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        PBKDF2_ALGORITHM,
        rounds,
        &salt,
        password.as_bytes(),
        &mut credential,
    );

    Ok(PasswordHash {
        hash: STANDARD.encode(credential),
        salt: STANDARD.encode(salt),
        iterations,
    })
}

/// Constant-time check of `password` against a stored hash.
pub fn verify_password(password: &str, stored: &PasswordHash) -> Result<bool, AuthError> {
    let rounds = NonZeroU32::new(stored.iterations).ok_or(AuthError::Iterations)?;
    let salt = STANDARD.decode(&stored.salt)?;
    let expected = STANDARD.decode(&stored.hash)?;

    Ok(pbkdf2::verify(
        PBKDF2_ALGORITHM,
        rounds,
        &salt,
        password.as_bytes(),
        &expected,
    )
    .is_ok())
}

/// A fresh opaque bearer token (32 random bytes, base64url).
pub fn generate_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; TOKEN_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AuthError::Random)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Sessions are stored under the token's SHA-256, never the token itself.
pub fn token_hash(token: &str) -> String {
    let digest = digest::digest(&digest::SHA256, token.as_bytes());
    digest
        .as_ref()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// An authenticated caller. Handlers that take a `Session` are reachable by
/// any signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub token_hash: String,
}

impl Session {
    /// Upgrade to the admin capability, or None for regular users.
    pub fn into_admin(self) -> Option<AdminSession> {
        if self.role.is_admin() {
            Some(AdminSession(self))
        } else {
            None
        }
    }
}

/// Proof that the caller holds the admin role. Only constructible through
/// `Session::into_admin`.
#[derive(Debug, Clone)]
pub struct AdminSession(Session);

impl AdminSession {
    pub fn session(&self) -> &Session {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse", 1_000).unwrap();
        assert!(verify_password("correct horse", &stored).unwrap());
        assert!(!verify_password("wrong horse", &stored).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same", 1_000).unwrap();
        let b = hash_password("same", 1_000).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(
            hash_password("pw", 0),
            Err(AuthError::Iterations)
        ));
    }

    #[test]
    fn test_tokens() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert_eq!(token_hash(&a).len(), 64);
        assert_eq!(token_hash(&a), token_hash(&a));
    }

    #[test]
    fn test_admin_upgrade() {
        let session = Session {
            user_id: "u1".to_string(),
            username: "ada".to_string(),
            role: Role::User,
            token_hash: "h".to_string(),
        };
        assert!(session.clone().into_admin().is_none());

        let admin = Session {
            role: Role::Admin,
            ..session
        };
        assert_eq!(admin.into_admin().unwrap().session().username, "ada");
    }
}
