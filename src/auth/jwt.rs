/// Access token issuance and validation
///
/// Access tokens are HS256 JWTs carrying `{iss, sub, iat, exp}`. They are never
/// stored; validity depends only on the signature, the issuer and `exp`.
///
/// `jsonwebtoken` verifies the signature before it deserialises the claims.
/// Its own `exp`/`iss` checks are switched off because they read the wall clock;
/// the codec applies them against the caller's `now` instead.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::AppError;

/// Why an access token was rejected, in the order the checks run
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token issuer does not match")]
    IssuerMismatch,
    #[error("token has expired")]
    Expired,
}

#[derive(Clone)]
pub struct AccessTokenCodec {
    issuer: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AccessTokenCodec {
    /// # Errors
    /// Rejects a non-positive `ttl`, which would mint tokens already expired
    pub fn new(issuer: impl Into<String>, secret: &[u8], ttl: Duration) -> Result<Self, AppError> {
        if ttl <= Duration::zero() {
            return Err(AppError::Internal(
                "access token lifetime must be positive".to_string(),
            ));
        }

        Ok(Self {
            issuer: issuer.into(),
            ttl,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    pub fn from_settings(settings: &JwtSettings) -> Result<Self, AppError> {
        let ttl = settings
            .access_ttl()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Self::new(settings.issuer.clone(), settings.secret.as_bytes(), ttl)
    }

    /// Sign a fresh access token for `subject`, valid from `now` for the configured TTL
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the expiry overflows or signing fails
    pub fn issue(&self, subject: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims::new(subject, &self.issuer, now, self.ttl)
            .ok_or_else(|| AppError::Internal("access token expiry out of range".to_string()))?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Validate `token` at instant `now` and return its subject
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            })?;

        if claims.iss != self.issuer {
            return Err(TokenError::IssuerMismatch);
        }

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        claims.user_id().ok_or(TokenError::Malformed)
    }
}
