//! In-process persistence backend.
//!
//! Selected with `STORE_BACKEND=memory` and used by the test suite. Users sit behind
//! a lock so the mail uniqueness check and the write happen together; sessions and
//! tokens are single-key maps whose removals are atomic per entry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{Session, Token, User};
use crate::services::store::{SessionRepository, StoreHealth, TokenRepository, UserRepository};
use crate::services::ServiceError;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    sessions: DashMap<String, Session>,
    tokens: DashMap<String, Token>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> ServiceError {
    ServiceError::Storage(anyhow::anyhow!("Memory store lock poisoned: {}", err))
}

fn mail_taken(users: &HashMap<String, User>, mail: &str, except_id: &str) -> bool {
    users
        .values()
        .any(|existing| existing.mail == mail && existing.id != except_id)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if mail_taken(&users, &user.mail, &user.id) {
            return Err(ServiceError::conflict("mail", "already registered"));
        }
        if users.contains_key(&user.id) {
            return Err(ServiceError::conflict("id", "already exists"));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users.read().map_err(poisoned)?.get(id).cloned())
    }

    async fn find_user_by_mail(&self, mail: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .users
            .read()
            .map_err(poisoned)?
            .values()
            .find(|user| user.mail == mail)
            .cloned())
    }

    async fn replace_user(&self, user: &User) -> Result<bool, ServiceError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if !users.contains_key(&user.id) {
            return Ok(false);
        }
        if mail_taken(&users, &user.mail, &user.id) {
            return Err(ServiceError::conflict("mail", "already registered"));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(true)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(self.users.write().map_err(poisoned)?.remove(id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.read().map_err(poisoned)?.values().cloned().collect())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<(), ServiceError> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, id: &str) -> Result<Option<Session>, ServiceError> {
        Ok(self.sessions.get(id).map(|entry| entry.value().clone()))
    }

    async fn delete_session(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(self.sessions.remove(id).is_some())
    }

    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<u64, ServiceError> {
        let mut removed = 0u64;
        self.sessions.retain(|_, session| {
            let keep = session.user_id != user_id;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn delete_sessions_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let mut removed = 0u64;
        self.sessions.retain(|_, session| {
            let keep = session.created_at >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn insert_token(&self, token: &Token) -> Result<(), ServiceError> {
        self.tokens.insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn take_token(&self, id: &str) -> Result<Option<Token>, ServiceError> {
        Ok(self.tokens.remove(id).map(|(_, token)| token))
    }

    async fn delete_tokens_expired_at(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let mut removed = 0u64;
        self.tokens.retain(|_, token| {
            let keep = !token.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        let _users = self.users.read().map_err(poisoned)?;
        Ok(())
    }
}
