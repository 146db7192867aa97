use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Hashes a password using Argon2id with a random salt.
///
/// ## Errors
/// Returns an error if password hashing fails.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::PasswordHash(format!("Failed to hash password: {e}")))
}

/// ## Summary
/// Checks that a stored value is a PHC-formatted hash `verify_password` can use.
///
/// ## Errors
/// Returns `PasswordHash` if the string cannot be parsed.
pub fn check_hash_format(password_hash: &str) -> ServiceResult<()> {
    PasswordHash::new(password_hash)
        .map(|_| ())
        .map_err(|e| ServiceError::PasswordHash(format!("Invalid password hash: {e}")))
}

/// ## Summary
/// Verifies a password against a stored Argon2 hash.
///
/// Returns `Ok(true)` on a match and `Ok(false)` on a mismatch.
///
/// ## Errors
/// Returns `PasswordHash` if the stored hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> ServiceResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ServiceError::PasswordHash(format!("Invalid password hash: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => {
            tracing::trace!(error = %err, "Password verification failed");
            Err(ServiceError::PasswordHash(err.to_string()))
        }
    }
}
