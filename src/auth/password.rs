use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::error;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

lazy_static! {
    static ref DUMMY_HASH: Option<String> = hash_password("gardenhub-absent-principal").ok();
}

/// Full argon2 verification against a throwaway hash. Login runs it for
/// unknown emails so both failure paths cost one verification.
pub fn verify_dummy(plain: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}

pub fn validate_password(plain: &str) -> Result<(), AppError> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidData(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_is_argon2id_and_verifies() {
        let hash = hash_password("sweet-pea-trellis").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("sweet-pea-trellis"));
        assert!(verify_password("sweet-pea-trellis", &hash).unwrap());
        assert!(!verify_password("sweet-pea-trellis ", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("marigold-bed").unwrap();
        let b = hash_password("marigold-bed").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn corrupt_stored_hash_is_an_error_not_a_mismatch() {
        // Login must surface this as an internal failure, never as bad credentials.
        assert!(verify_password("marigold-bed", "").is_err());
        assert!(verify_password("marigold-bed", "$argon2id$truncated").is_err());
    }

    #[test]
    fn dummy_hash_exists_and_matches_nothing_a_user_sends() {
        let dummy = DUMMY_HASH.as_deref().expect("dummy hash is built");
        assert!(dummy.starts_with("$argon2id$"));
        assert!(!verify_password("marigold-bed", dummy).unwrap());
        verify_dummy("marigold-bed");
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        // Seven multi-byte characters are still too short.
        assert!(validate_password("ééééééé").is_err());
    }

    #[test]
    fn email_normalization_and_shape() {
        assert_eq!(normalize_email("  Rose@Garden.ORG "), "rose@garden.org");
        assert!(is_valid_email("rose.bush@garden.org"));
        assert!(is_valid_email("a-b@c.io"));
        assert!(!is_valid_email("no-at-sign.org"));
        assert!(!is_valid_email("rose@garden"));
    }
}
