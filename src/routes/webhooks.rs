/// Inbound webhooks from the payment provider

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::require_api_key;
use crate::clock::Clock;
use crate::configuration::Settings;
use crate::error::{AppError, ErrorContext, ValidationError};
use crate::store::{Store, UserStore};

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub user_id: String,
}

/// POST /api/webhooks
///
/// The key is checked before the body is parsed. Events other than
/// `user.upgraded` are acknowledged and ignored.
///
/// # Errors
/// - 400: unparseable body or malformed user id
/// - 401: missing or wrong API key
/// - 404: unknown user
pub async fn handle_webhook(
    req: HttpRequest,
    body: web::Bytes,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("webhook");

    require_api_key(&req, &settings.webhook.api_key).map_err(|e| {
        let e = AppError::from(e);
        context.log_error(&e);
        e
    })?;

    let payload: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| ValidationError::InvalidFormat("webhook payload".to_string()))?;

    if payload.event != USER_UPGRADED {
        tracing::debug!(
            request_id = %context.request_id,
            event = %payload.event,
            "Ignoring webhook event"
        );
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = Uuid::parse_str(payload.data.user_id.trim())
        .map_err(|_| ValidationError::InvalidFormat("user_id".to_string()))?;

    if !store.upgrade_user(user_id, clock.now()).await? {
        return Err(AppError::NotFound("User".to_string()));
    }

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "User upgraded to premium"
    );

    Ok(HttpResponse::NoContent().finish())
}
