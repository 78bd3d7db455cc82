/// Persistence for users, posts and refresh tokens
///
/// Handlers only see the `Store` trait object. `PgStore` backs production;
/// `MemoryStore` backs tests and database-less runs.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RefreshTokenRecord;
use crate::error::DatabaseError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    pub is_premium: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UniqueConstraintViolation` if the email is taken.
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<User, DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Returns `None` if no user has this id.
    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DatabaseError>;

    /// Sets the premium flag; `false` if no user has this id.
    async fn upgrade_user(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, DatabaseError>;

    /// Deletes every user together with their posts and refresh tokens.
    async fn delete_all_users(&self) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(
        &self,
        user_id: Uuid,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Post, DatabaseError>;

    /// Posts ordered by creation time, optionally restricted to one author.
    async fn list_posts(
        &self,
        author_id: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Post>, DatabaseError>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, DatabaseError>;

    /// `false` if there was nothing to delete.
    async fn delete_post(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Fails with `UniqueConstraintViolation` if the token already exists.
    async fn insert_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError>;

    /// Returns the record whatever its state; callers decide usability.
    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DatabaseError>;

    /// Persists `record.revoked_at` unless the stored record is already
    /// revoked. `false` if the token is unknown.
    async fn save_revocation(&self, record: &RefreshTokenRecord) -> Result<bool, DatabaseError>;
}

pub trait Store: UserStore + PostStore + RefreshTokenStore {}

impl<T> Store for T where T: UserStore + PostStore + RefreshTokenStore {}
