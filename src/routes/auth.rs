/// Session routes
///
/// Login issues an access token plus a refresh token. The refresh token is
/// then presented as a Bearer credential to mint new access tokens or to
/// revoke the session.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    bearer_token, issue_refresh_token, reject_unknown_account, revoke, rotate, verify_password,
    AccessTokenCodec,
};
use crate::clock::Clock;
use crate::configuration::Settings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::routes::users::UserResponse;
use crate::store::{RefreshTokenStore, Store, UserStore};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: unknown email or wrong password (indistinguishable)
///
/// # Security Notes
/// - An unknown email still pays for one bcrypt verification
pub async fn login(
    form: web::Json<LoginRequest>,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
    codec: web::Data<AccessTokenCodec>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let user = match store.find_user_by_email(form.email.trim()).await? {
        Some(user) => user,
        None => {
            let e = AppError::from(reject_unknown_account(&form.password));
            context.log_error(&e);
            return Err(e);
        }
    };

    verify_password(&form.password, &user.hashed_password)?;

    let refresh_ttl = settings
        .jwt
        .refresh_ttl()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let now = clock.now();
    let access_token = codec.issue(user.id, now)?;
    let refresh = issue_refresh_token(store.get_ref(), user.id, now, refresh_ttl).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User logged in"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(user),
        access_token,
        refresh_token: refresh.token,
    }))
}

/// POST /api/refresh
///
/// `Authorization: Bearer <refresh token>`. The refresh token stays valid.
pub async fn refresh_access_token(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
    codec: web::Data<AccessTokenCodec>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let token = bearer_token(&req)?;
    let record = store
        .find_refresh_token(&token)
        .await?
        .ok_or(AuthError::RefreshTokenNotFound)?;

    let access_token = rotate(&record, codec.get_ref(), clock.now()).map_err(|e| {
        context.log_error(&e);
        e
    })?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %record.user_id,
        "Access token refreshed"
    );

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

/// POST /api/revoke
///
/// `Authorization: Bearer <refresh token>`. Revoking twice is not an error;
/// the first revocation instant is kept.
pub async fn revoke_refresh_token(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_revoke");

    let token = bearer_token(&req)?;
    let record = store
        .find_refresh_token(&token)
        .await?
        .ok_or(AuthError::RefreshTokenNotFound)?;
    let user_id = record.user_id;

    let revoked = revoke(record, clock.now());
    if !store.save_revocation(&revoked).await? {
        // Deleted between lookup and update.
        return Err(AuthError::RefreshTokenNotFound.into());
    }

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "Refresh token revoked"
    );

    Ok(HttpResponse::NoContent().finish())
}
