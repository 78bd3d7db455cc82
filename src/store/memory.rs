/// In-memory implementation of the store traits, used by tests and `database.in_memory`

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Post, PostStore, RefreshTokenStore, SortOrder, User, UserStore};
use crate::auth::RefreshTokenRecord;
use crate::error::DatabaseError;

/// In-process store with the same observable behaviour as `PgStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    posts: RwLock<Vec<Post>>,
    refresh_tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_premium: false,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        Ok(users.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn upgrade_user(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let mut users = self.users.write().await;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.is_premium = true;
                user.updated_at = now;
                true
            }
            None => false,
        })
    }

    async fn delete_all_users(&self) -> Result<u64, DatabaseError> {
        let mut users = self.users.write().await;
        let deleted = users.len() as u64;
        users.clear();
        self.posts.write().await.clear();
        self.refresh_tokens.write().await.clear();
        Ok(deleted)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(
        &self,
        user_id: Uuid,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Post, DatabaseError> {
        if !self.users.read().await.contains_key(&user_id) {
            return Err(DatabaseError::NotFound("Author".to_string()));
        }

        let post = Post {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn list_posts(
        &self,
        author_id: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Post>, DatabaseError> {
        let posts = self.posts.read().await;
        // Insertion order breaks ties between equal timestamps.
        let mut selected: Vec<Post> = posts
            .iter()
            .filter(|p| author_id.map_or(true, |id| p.user_id == id))
            .cloned()
            .collect();
        selected.sort_by_key(|p| p.created_at);
        if order == SortOrder::Desc {
            selected.reverse();
        }
        Ok(selected)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, DatabaseError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError> {
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(&record.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens_pkey".to_string(),
            ));
        }
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        Ok(self.refresh_tokens.read().await.get(token).cloned())
    }

    async fn save_revocation(&self, record: &RefreshTokenRecord) -> Result<bool, DatabaseError> {
        let mut tokens = self.refresh_tokens.write().await;
        Ok(match tokens.get_mut(&record.token) {
            Some(stored) => {
                if stored.revoked_at.is_none() {
                    stored.revoked_at = record.revoked_at;
                }
                true
            }
            None => false,
        })
    }
}
