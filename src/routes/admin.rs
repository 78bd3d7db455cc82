/// Admin routes

use actix_web::{web, HttpResponse};

use crate::configuration::Settings;
use crate::error::{AppError, ErrorContext};
use crate::middleware::HitCounter;
use crate::store::{Store, UserStore};

/// GET /admin/metrics
pub async fn metrics(hits: web::Data<HitCounter>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(format!(
            r#"<html>
  <body>
    <h1>Welcome, Squawk Admin</h1>
    <p>Squawk has been visited {} times!</p>
  </body>
</html>"#,
            hits.hits()
        ))
}

/// POST /admin/reset
///
/// Development only: zeroes the hit counter and deletes every user, which
/// takes their posts and refresh tokens with them.
pub async fn reset(
    settings: web::Data<Settings>,
    store: web::Data<dyn Store>,
    hits: web::Data<HitCounter>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("admin_reset");

    if !settings.application.is_dev() {
        let e = AppError::Forbidden("reset is only available on the dev platform".to_string());
        context.log_error(&e);
        return Err(e);
    }

    hits.reset();
    let deleted = store.delete_all_users().await?;

    tracing::warn!(
        request_id = %context.request_id,
        deleted_users = deleted,
        "State reset"
    );

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0 and all users deleted."))
}
