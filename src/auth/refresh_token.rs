/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 random bytes from the OS generator, hex encoded (64 chars)
/// - Long lived and reusable: refreshing mints a new access token but leaves
///   the refresh token in place until it expires or is revoked
/// - Revocable exactly once; `revoked_at` never moves after it is set
///
/// Everything here works on a snapshot of the stored record; persistence lives
/// behind `RefreshTokenStore`.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::jwt::AccessTokenCodec;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::RefreshTokenStore;

const REFRESH_TOKEN_BYTES: usize = 32;
const MAX_GENERATION_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RefreshTokenError {
    #[error("refresh token has expired")]
    Expired,
    #[error("refresh token has been revoked")]
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Fresh, unrevoked record valid for `ttl` from `now`
    ///
    /// # Errors
    /// Rejects a non-positive `ttl`, which would break `issued_at < expires_at`
    pub fn new(
        token: String,
        user_id: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, AppError> {
        if ttl <= Duration::zero() {
            return Err(AppError::Internal(
                "refresh token lifetime must be positive".to_string(),
            ));
        }

        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::Internal("refresh token expiry out of range".to_string())
        })?;

        Ok(Self {
            token,
            user_id,
            issued_at: now,
            expires_at,
            revoked_at: None,
        })
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Generate a new cryptographically secure refresh token
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether `record` may still be exchanged for access tokens at `now`
pub fn is_usable(record: &RefreshTokenRecord, now: DateTime<Utc>) -> Result<(), RefreshTokenError> {
    if now >= record.expires_at {
        return Err(RefreshTokenError::Expired);
    }
    if record.is_revoked() {
        return Err(RefreshTokenError::Revoked);
    }
    Ok(())
}

/// Mint an access token for the record's owner
///
/// The refresh token itself is left untouched.
pub fn rotate(
    record: &RefreshTokenRecord,
    codec: &AccessTokenCodec,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    is_usable(record, now).map_err(AuthError::from)?;
    codec.issue(record.user_id, now)
}

/// Mark `record` revoked at `now`; an earlier revocation is kept as is
pub fn revoke(mut record: RefreshTokenRecord, now: DateTime<Utc>) -> RefreshTokenRecord {
    if record.revoked_at.is_none() {
        record.revoked_at = Some(now);
    }
    record
}

/// Generate and persist a refresh token for `user_id`
///
/// A uniqueness violation from the store means the random token collided;
/// it is retried with fresh randomness a few times before giving up.
pub async fn issue_refresh_token<S>(
    store: &S,
    user_id: Uuid,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<RefreshTokenRecord, AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let record = RefreshTokenRecord::new(generate_refresh_token(), user_id, now, ttl)?;

        match store.insert_refresh_token(&record).await {
            Ok(()) => return Ok(record),
            Err(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(
                    user_id = %user_id,
                    attempt = attempt,
                    "Refresh token collision, regenerating"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(
        "refresh token generation exhausted its retry budget".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn record() -> RefreshTokenRecord {
        RefreshTokenRecord::new(generate_refresh_token(), Uuid::new_v4(), t0(), Duration::days(60))
            .unwrap()
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), 64);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_tokens_are_unique() {
        let first = generate_refresh_token();
        let second = generate_refresh_token();
        assert_ne!(first, second);
    }

    #[test]
    fn test_record_requires_positive_ttl() {
        let result =
            RefreshTokenRecord::new(generate_refresh_token(), Uuid::new_v4(), t0(), Duration::zero());
        assert!(result.is_err());

        let record = record();
        assert!(record.issued_at < record.expires_at);
        assert!(!record.is_revoked());
    }

    #[test]
    fn test_lifecycle() {
        let record = record();
        assert_eq!(is_usable(&record, t0() + Duration::days(1)), Ok(()));

        let revoked = revoke(record.clone(), t0() + Duration::hours(2));
        assert_eq!(
            is_usable(&revoked, t0() + Duration::days(1)),
            Err(RefreshTokenError::Revoked)
        );

        assert_eq!(
            is_usable(&record, t0() + Duration::days(61)),
            Err(RefreshTokenError::Expired)
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let record = record();
        assert_eq!(
            is_usable(&record, record.expires_at - Duration::seconds(1)),
            Ok(())
        );
        assert_eq!(
            is_usable(&record, record.expires_at),
            Err(RefreshTokenError::Expired)
        );
    }

    #[test]
    fn test_expired_and_revoked_reports_expired() {
        let revoked = revoke(record(), t0());
        assert_eq!(
            is_usable(&revoked, t0() + Duration::days(61)),
            Err(RefreshTokenError::Expired)
        );
        assert_eq!(
            is_usable(&revoked, revoked.expires_at),
            Err(RefreshTokenError::Expired)
        );
    }

    #[test]
    fn test_record_rejects_overflowing_ttl() {
        let result = RefreshTokenRecord::new(
            generate_refresh_token(),
            Uuid::new_v4(),
            t0(),
            Duration::days(100_000_000),
        );
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_revocation_in_the_future_still_counts() {
        let revoked = revoke(record(), t0() + Duration::days(10));
        assert_eq!(
            is_usable(&revoked, t0() + Duration::days(1)),
            Err(RefreshTokenError::Revoked)
        );
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let once = revoke(record(), t0() + Duration::hours(1));
        let twice = revoke(once.clone(), t0() + Duration::hours(5));

        assert_eq!(once, twice);
        assert_eq!(twice.revoked_at, Some(t0() + Duration::hours(1)));
    }

    #[test]
    fn test_rotate_mints_access_token_for_owner() {
        let codec = AccessTokenCodec::new("test", b"rotation-secret", Duration::hours(1)).unwrap();
        let record = record();
        let now = t0() + Duration::days(3);

        let first = rotate(&record, &codec, now).expect("rotation failed");
        let second = rotate(&record, &codec, now + Duration::minutes(5)).expect("reuse failed");

        assert_eq!(codec.validate(&first, now), Ok(record.user_id));
        assert_eq!(
            codec.validate(&second, now + Duration::minutes(5)),
            Ok(record.user_id)
        );
    }

    #[test]
    fn test_rotate_refuses_unusable_records() {
        let codec = AccessTokenCodec::new("test", b"rotation-secret", Duration::hours(1)).unwrap();

        let revoked = revoke(record(), t0());
        assert!(matches!(
            rotate(&revoked, &codec, t0() + Duration::days(1)),
            Err(AppError::Auth(AuthError::RefreshToken(RefreshTokenError::Revoked)))
        ));

        assert!(matches!(
            rotate(&record(), &codec, t0() + Duration::days(60)),
            Err(AppError::Auth(AuthError::RefreshToken(RefreshTokenError::Expired)))
        ));
    }

    #[test]
    fn test_rotated_token_still_needs_matching_codec() {
        let codec = AccessTokenCodec::new("test", b"rotation-secret", Duration::hours(1)).unwrap();
        let other = AccessTokenCodec::new("test", b"different-secret", Duration::hours(1)).unwrap();
        let token = rotate(&record(), &codec, t0()).unwrap();

        assert_eq!(other.validate(&token, t0()), Err(TokenError::SignatureInvalid));
    }

    #[tokio::test]
    async fn test_issue_persists_record() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let issued = issue_refresh_token(&store, user_id, t0(), Duration::days(60))
            .await
            .expect("issue failed");

        let stored = store
            .find_refresh_token(&issued.token)
            .await
            .unwrap()
            .expect("record not stored");
        assert_eq!(stored, issued);
        assert_eq!(stored.expires_at, t0() + Duration::days(60));
    }

    /// Store that reports a collision for the first `collisions` inserts
    struct CollidingStore {
        collisions: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl RefreshTokenStore for CollidingStore {
        async fn insert_refresh_token(
            &self,
            _record: &RefreshTokenRecord,
        ) -> Result<(), DatabaseError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.collisions {
                Err(DatabaseError::UniqueConstraintViolation("token".to_string()))
            } else {
                Ok(())
            }
        }

        async fn find_refresh_token(
            &self,
            _token: &str,
        ) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
            Ok(None)
        }

        async fn save_revocation(&self, _record: &RefreshTokenRecord) -> Result<bool, DatabaseError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_collision_is_retried() {
        let store = CollidingStore {
            collisions: 2,
            attempts: AtomicUsize::new(0),
        };

        let result = issue_refresh_token(&store, Uuid::new_v4(), t0(), Duration::days(60)).await;
        assert!(result.is_ok());
        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_collision_retry_budget_is_finite() {
        let store = CollidingStore {
            collisions: usize::MAX,
            attempts: AtomicUsize::new(0),
        };

        let result = issue_refresh_token(&store, Uuid::new_v4(), t0(), Duration::days(60)).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(store.attempts.load(Ordering::SeqCst), MAX_GENERATION_ATTEMPTS);
    }
}
