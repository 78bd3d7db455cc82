/// Password Hashing and Verification
///
/// bcrypt at `DEFAULT_COST`: salted, adaptive, and slow on purpose.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::error::{AppError, AuthError};

lazy_static! {
    /// Hash of a throwaway secret, verified against when the account does not
    /// exist so a login miss costs as much as a wrong password.
    static ref DUMMY_HASH: Option<String> = hash("squawk-timing-equaliser", DEFAULT_COST).ok();
}

/// Hash a password using bcrypt
///
/// # Errors
/// Returns `AppError::Internal` if bcrypt itself fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// A wrong password and an unparsable stored hash fail identically.
pub fn verify_password(password: &str, hashed: &str) -> Result<(), AuthError> {
    match verify(password, hashed) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials),
        Err(e) => {
            tracing::debug!("Stored password hash rejected by bcrypt: {}", e);
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Burn one verification's worth of work and fail
pub fn reject_unknown_account(password: &str) -> AuthError {
    if let Some(dummy) = DUMMY_HASH.as_ref() {
        let _ = verify(password, dummy);
    }
    AuthError::InvalidCredentials
}
