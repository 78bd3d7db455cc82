/// Access token authentication for protected handlers
///
/// Handlers that need a signed-in user take an `AuthenticatedUser` argument.
/// Extraction reads the Bearer token from the Authorization header and
/// validates it against the shared `AccessTokenCodec` at the injected clock's
/// current instant. Any failure becomes the uniform 401.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use uuid::Uuid;

use crate::auth::{bearer_token, AccessTokenCodec};
use crate::clock::Clock;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

/// Validate the request's access token and return its subject
pub fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let codec = req
        .app_data::<web::Data<AccessTokenCodec>>()
        .ok_or_else(|| AppError::Internal("access token codec is not configured".to_string()))?;
    let clock = req
        .app_data::<web::Data<dyn Clock>>()
        .ok_or_else(|| AppError::Internal("clock is not configured".to_string()))?;

    let token = bearer_token(req)?;
    let user_id = codec.validate(&token, clock.now()).map_err(|e| {
        tracing::debug!(path = %req.path(), error = %e, "Access token rejected");
        e
    })?;

    Ok(AuthenticatedUser(user_id))
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
