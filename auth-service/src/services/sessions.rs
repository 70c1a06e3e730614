//! Server-side sessions.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;

use crate::models::Session;
use crate::services::store::SessionRepository;
use crate::services::ServiceError;

#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
}

impl SessionStore {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, user_id: &str) -> Result<Session, ServiceError> {
        let session = Session::new(user_id.to_string());
        self.repo.insert_session(&session).await?;
        tracing::debug!("Session created");
        Ok(session)
    }

    pub async fn get(&self, id: &str) -> Result<Session, ServiceError> {
        self.repo
            .find_session(id)
            .await?
            .ok_or(ServiceError::NotFound("Session"))
    }

    /// Logout or explicit invalidation of one session.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if !self.repo.delete_session(id).await? {
            return Err(ServiceError::NotFound("Session"));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_for_user(&self, user_id: &str) -> Result<u64, ServiceError> {
        let removed = self.repo.delete_sessions_for_user(user_id).await?;
        tracing::debug!(removed, "Sessions invalidated for user");
        Ok(removed)
    }

    /// Removes every session created strictly before `cutoff` and returns how many
    /// went. Repeating the call with the same cutoff removes nothing further.
    #[instrument(skip(self))]
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, ServiceError> {
        self.repo.delete_sessions_created_before(cutoff).await
    }
}
