//! Persistence collaborator seams.
//!
//! Every keyed document operation the core needs, split per entity. Each single-record
//! call is atomic in the backing store: a read returns a whole document or nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::models::{Session, Token, User};
use crate::services::ServiceError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the mail is already taken.
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError>;
    async fn find_user(&self, id: &str) -> Result<Option<User>, ServiceError>;
    async fn find_user_by_mail(&self, mail: &str) -> Result<Option<User>, ServiceError>;
    /// Replaces the whole record. Returns `false` when no record has that id.
    async fn replace_user(&self, user: &User) -> Result<bool, ServiceError>;
    async fn delete_user(&self, id: &str) -> Result<bool, ServiceError>;
    async fn list_users(&self) -> Result<Vec<User>, ServiceError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), ServiceError>;
    async fn find_session(&self, id: &str) -> Result<Option<Session>, ServiceError>;
    async fn delete_session(&self, id: &str) -> Result<bool, ServiceError>;
    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<u64, ServiceError>;
    /// Removes every session whose `created_at` is strictly before `cutoff`.
    async fn delete_sessions_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ServiceError>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert_token(&self, token: &Token) -> Result<(), ServiceError>;
    /// Removes and returns the token in one step; of concurrent callers at most one
    /// gets `Some`.
    async fn take_token(&self, id: &str) -> Result<Option<Token>, ServiceError>;
    /// Removes tokens whose `expires_at` is at or before `now`.
    async fn delete_tokens_expired_at(&self, now: DateTime<Utc>) -> Result<u64, ServiceError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// The backend handles the components are built from.
#[derive(Clone)]
pub struct Persistence {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Persistence {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserRepository + SessionRepository + TokenRepository + StoreHealth + 'static,
    {
        Self {
            users: backend.clone(),
            sessions: backend.clone(),
            tokens: backend.clone(),
            health: backend,
        }
    }
}
