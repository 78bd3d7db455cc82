/// API key check for inbound webhooks
///
/// Webhook callers send `Authorization: ApiKey <key>`.

use actix_web::HttpRequest;
use sha2::{Digest, Sha256};

use crate::auth::bearer::{authorization_values, extract_credential};
use crate::error::AuthError;

/// Compare the presented key against `expected`
///
/// Both sides are digested first so the comparison is fixed-length and does
/// not short-circuit on the first differing byte.
pub fn verify_api_key(presented: &str, expected: &str) -> Result<(), AuthError> {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());

    let diff = presented
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));

    if diff == 0 {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}

/// Require the request to carry `expected` as its API key
pub fn require_api_key(req: &HttpRequest, expected: &str) -> Result<(), AuthError> {
    let presented = extract_credential(authorization_values(req), "apikey")?;
    verify_api_key(&presented, expected)
}
