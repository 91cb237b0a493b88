//! Salted one-way hashing of account credentials (Argon2id, PHC strings).
//!
//! Plain credentials only live in memory for the duration of a register or
//! login call; what gets stored is the PHC string returned by
//! [`hash_credential`].

use argon2::{
    Argon2,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use crate::{EngineError, ResultEngine};

pub fn hash_credential(credential: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(credential.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Credential(err.to_string()))
}

/// Check `credential` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_credential(credential: &str, stored: &str) -> ResultEngine<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|err| EngineError::Credential(format!("invalid stored hash: {err}")))?;
    match Argon2::default().verify_password(credential.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(other) => Err(EngineError::Credential(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let first = hash_credential("hunter2").unwrap();
        let second = hash_credential("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(!first.contains("hunter2"));
        assert!(verify_credential("hunter2", &first).unwrap());
        assert!(!verify_credential("hunter3", &first).unwrap());
    }

    #[test]
    fn plaintext_is_not_a_valid_stored_hash() {
        assert!(matches!(
            verify_credential("hunter2", "hunter2"),
            Err(EngineError::Credential(_))
        ));
    }
}
