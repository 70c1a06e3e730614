//! User records: provisioning, tiered reads and credential checks.

use std::sync::Arc;
use tracing::instrument;

use crate::models::{is_valid_pin, project, AccessScope, CredentialKind, NewUser, ProjectedUser, User};
use crate::services::codec::CredentialCodec;
use crate::services::store::UserRepository;
use crate::services::ServiceError;

#[derive(Clone)]
pub struct UserStore {
    repo: Arc<dyn UserRepository>,
}

impl UserStore {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Provisions a user and returns its id.
    #[instrument(skip_all, fields(mail = %new.mail))]
    pub async fn create(&self, new: NewUser) -> Result<String, ServiceError> {
        let user = User::from_new(new);
        validate_user(&user)?;

        if self.repo.find_user_by_mail(&user.mail).await?.is_some() {
            return Err(ServiceError::conflict("mail", "already registered"));
        }

        self.repo.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user.id)
    }

    pub async fn get(&self, id: &str, scope: AccessScope) -> Result<ProjectedUser, ServiceError> {
        let user = self.find(id).await?;
        Ok(project(&user, scope))
    }

    /// Full record read for update flows. Never hand the result to a caller as is.
    pub async fn find(&self, id: &str) -> Result<User, ServiceError> {
        self.repo
            .find_user(id)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Replaces the stored record. Nothing is written when validation fails.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn update(&self, user: User) -> Result<(), ServiceError> {
        validate_user(&user)?;

        if let Some(owner) = self.repo.find_user_by_mail(&user.mail).await? {
            if owner.id != user.id {
                return Err(ServiceError::conflict("mail", "already registered"));
            }
        }

        if !self.repo.replace_user(&user).await? {
            return Err(ServiceError::NotFound("User"));
        }
        tracing::info!("User updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if !self.repo.delete_user(id).await? {
            return Err(ServiceError::NotFound("User"));
        }
        tracing::info!("User deleted");
        Ok(())
    }

    pub async fn list(&self, scope: AccessScope) -> Result<Vec<ProjectedUser>, ServiceError> {
        let users = self.repo.list_users().await?;
        Ok(users.iter().map(|user| project(user, scope)).collect())
    }

    /// Checks one credential of a user.
    ///
    /// A missing user, a record without that kind of credential and a mismatch all fail
    /// with the same `Unauthorized`.
    #[instrument(skip(self, value), fields(kind = kind.as_str()))]
    pub async fn authenticate(
        &self,
        id: &str,
        kind: CredentialKind,
        value: &str,
    ) -> Result<User, ServiceError> {
        let Some(user) = self.repo.find_user(id).await? else {
            tracing::debug!("Authentication for unknown user");
            return Err(ServiceError::Unauthorized);
        };

        let accepted = match kind {
            CredentialKind::Hash => {
                !user.secret_hash.is_empty() && CredentialCodec::matches(value, &user.secret_hash)
            }
            CredentialKind::Pin => user.pin.as_deref().is_some_and(|pin| pin == value),
        };

        if accepted {
            Ok(user)
        } else {
            tracing::debug!("Credential mismatch");
            Err(ServiceError::Unauthorized)
        }
    }
}

fn validate_user(user: &User) -> Result<(), ServiceError> {
    if user.id.trim().is_empty() {
        return Err(ServiceError::validation("id", "must not be empty"));
    }
    if user.mail.trim().is_empty() || !user.mail.contains('@') {
        return Err(ServiceError::validation("mail", "must be a mail address"));
    }
    if user.secret_hash.is_empty() {
        return Err(ServiceError::validation("secret_hash", "must not be empty"));
    }
    if let Some(pin) = &user.pin {
        if !is_valid_pin(pin) {
            return Err(ServiceError::validation("pin", "must contain digits only"));
        }
    }
    Ok(())
}
