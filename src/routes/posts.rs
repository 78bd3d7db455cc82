/// Post routes

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::moderation::clean_body;
use crate::store::{PostStore, SortOrder, Store};
use crate::validators::is_valid_post_body;

#[derive(Deserialize)]
pub struct PostRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct ListPostsQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

impl ListPostsQuery {
    /// Empty parameters count as absent
    fn author_id(&self) -> Result<Option<Uuid>, ValidationError> {
        match self.author_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| ValidationError::InvalidFormat("author_id".to_string())),
        }
    }

    fn sort(&self) -> Result<SortOrder, ValidationError> {
        match self.sort.as_deref().map(str::trim) {
            None | Some("") => Ok(SortOrder::default()),
            Some(raw) if raw.eq_ignore_ascii_case("asc") => Ok(SortOrder::Asc),
            Some(raw) if raw.eq_ignore_ascii_case("desc") => Ok(SortOrder::Desc),
            Some(_) => Err(ValidationError::InvalidFormat("sort".to_string())),
        }
    }
}

/// A malformed id can never name a post, so it is reported as missing
fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Post".to_string()))
}

/// POST /api/posts
///
/// # Errors
/// - 400: empty body or longer than 140 characters
/// - 401: missing or invalid access token
pub async fn create_post(
    user: AuthenticatedUser,
    form: web::Json<PostRequest>,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("create_post").with_user_id(user.id().to_string());

    is_valid_post_body(&form.body)?;
    let body = clean_body(&form.body);

    let post = store
        .create_post(user.id(), &body, clock.now())
        .await
        .map_err(|e| {
            let e = AppError::from(e);
            context.log_error(&e);
            e
        })?;

    tracing::info!(
        request_id = %context.request_id,
        post_id = %post.id,
        user_id = %post.user_id,
        "Post created"
    );

    Ok(HttpResponse::Created().json(post))
}

/// GET /api/posts?author_id=<uuid>&sort=asc|desc
pub async fn list_posts(
    query: web::Query<ListPostsQuery>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let author_id = query.author_id()?;
    let order = query.sort()?;

    let posts = store.list_posts(author_id, order).await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{post_id}
pub async fn get_post(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let post_id = parse_post_id(&path)?;

    let post = store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post".to_string()))?;

    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{post_id}
///
/// # Errors
/// - 401: missing or invalid access token
/// - 403: caller is not the author
/// - 404: no such post
pub async fn delete_post(
    user: AuthenticatedUser,
    path: web::Path<String>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("delete_post").with_user_id(user.id().to_string());
    let post_id = parse_post_id(&path)?;

    let post = store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post".to_string()))?;

    if post.user_id != user.id() {
        let e = AppError::Forbidden("only the author may delete a post".to_string());
        context.log_error(&e);
        return Err(e);
    }

    if !store.delete_post(post_id).await? {
        return Err(AppError::NotFound("Post".to_string()));
    }

    tracing::info!(
        request_id = %context.request_id,
        post_id = %post_id,
        "Post deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
