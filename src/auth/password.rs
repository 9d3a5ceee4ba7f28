//! Argon2id password hashing
//!
//! Registration stores only the PHC-formatted digest; the raw password
//! exists nowhere outside this module's two functions.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::{CabinetError, Result};

/// Hash a password with a fresh random salt.
///
/// The returned PHC string embeds the salt and parameters, so verification
/// needs no out-of-band state.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CabinetError::Internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored digest.
///
/// A digest that fails to parse is an internal error, never an
/// authentication verdict.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| CabinetError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_phc_formatted_and_verifies() {
        let hash = hash_password("toto1234!").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("toto1234!", &hash).unwrap());
        assert!(!verify_password("toto1234?", &hash).unwrap());
    }

    #[test]
    fn repeated_hashing_salts_differently() {
        let first = hash_password("bob@dylan.com").unwrap();
        let second = hash_password("bob@dylan.com").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("bob@dylan.com", &first).unwrap());
        assert!(verify_password("bob@dylan.com", &second).unwrap());
    }

    #[test]
    fn unparsable_digest_is_an_error_not_a_mismatch() {
        assert!(verify_password("anything", "sha1:plainly-wrong").is_err());
    }
}
