//! Orchestration of the login, password, token and profile-view flows.

use std::sync::Arc;
use tracing::instrument;

use crate::models::{AccessScope, CredentialKind, Popup, ProjectedUser, Session, Token, PROFILE_VIEW_PURPOSE};
use crate::services::display::DisplayProvider;
use crate::services::metrics;
use crate::services::sessions::SessionStore;
use crate::services::tokens::TokenIssuer;
use crate::services::users::UserStore;
use crate::services::ServiceError;

#[derive(Clone)]
pub struct AuthCoordinator {
    users: UserStore,
    sessions: SessionStore,
    tokens: TokenIssuer,
    display: Arc<dyn DisplayProvider>,
    service_name: String,
    public_base_url: String,
}

impl AuthCoordinator {
    pub fn new(
        users: UserStore,
        sessions: SessionStore,
        tokens: TokenIssuer,
        display: Arc<dyn DisplayProvider>,
        service_name: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            display,
            service_name: service_name.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Opens a session for a user presenting the hash of their secret.
    #[instrument(skip(self, hashed_secret))]
    pub async fn login(&self, user_id: &str, hashed_secret: &str) -> Result<Session, ServiceError> {
        self.login_with(user_id, CredentialKind::Hash, hashed_secret)
            .await
    }

    /// Opens a session with the PIN. A PIN session grants nothing beyond the session
    /// itself; privileged changes still require the secret hash.
    #[instrument(skip(self, pin))]
    pub async fn login_with_pin(&self, user_id: &str, pin: &str) -> Result<Session, ServiceError> {
        self.login_with(user_id, CredentialKind::Pin, pin).await
    }

    async fn login_with(
        &self,
        user_id: &str,
        kind: CredentialKind,
        value: &str,
    ) -> Result<Session, ServiceError> {
        let user = match self.users.authenticate(user_id, kind, value).await {
            Ok(user) => user,
            Err(err) => {
                metrics::record_login(kind.as_str(), false);
                if matches!(err, ServiceError::Unauthorized) {
                    tracing::warn!(kind = kind.as_str(), "Login failed");
                }
                return Err(err);
            }
        };

        let session = self.sessions.create(&user.id).await?;
        metrics::record_login(kind.as_str(), true);
        tracing::info!(user_id = %user.id, kind = kind.as_str(), "User logged in");
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, session_id: &str) -> Result<(), ServiceError> {
        self.sessions.delete(session_id).await?;
        tracing::info!("Session closed");
        Ok(())
    }

    /// Replaces the secret hash after checking the current one.
    ///
    /// The stored record is read again right before the comparison and the write is a
    /// whole-record replace, so concurrent changes resolve last-writer-wins.
    #[instrument(skip(self, old_hash, new_hash))]
    pub async fn change_password(
        &self,
        user_id: &str,
        old_hash: &str,
        new_hash: &str,
    ) -> Result<(), ServiceError> {
        if new_hash.is_empty() {
            return Err(ServiceError::validation("new_secret", "must not be empty"));
        }

        let mut user = self
            .users
            .authenticate(user_id, CredentialKind::Hash, old_hash)
            .await
            .inspect_err(|_| tracing::warn!("Password change rejected"))?;

        user.secret_hash = new_hash.to_string();
        self.users.update(user).await?;
        tracing::info!("Password changed");
        Ok(())
    }

    pub async fn issue_token(&self, session_id: &str, purpose: &str) -> Result<Token, ServiceError> {
        self.tokens.issue(session_id, purpose).await
    }

    /// Issues a profile-view token and asks the display service to open the profile
    /// page for the session's user.
    #[instrument(skip(self))]
    pub async fn show_profile(&self, session_id: &str) -> Result<Popup, ServiceError> {
        let token = self.tokens.issue(session_id, PROFILE_VIEW_PURPOSE).await?;
        let popup = Popup {
            title: "Profile".to_string(),
            frame_url: format!(
                "{}/profile/view?sid={}&token={}",
                self.public_base_url, session_id, token.id
            ),
            service_id: self.service_name.clone(),
        };

        self.display.display_popup(session_id, &popup).await?;
        tracing::info!("Profile popup requested");
        Ok(popup)
    }

    /// Resolves the public profile behind a profile-view link. Only `profile-view` tokens
    /// are accepted, and the token is consumed even when it turns out to belong to another
    /// session or purpose.
    #[instrument(skip(self, token_id))]
    pub async fn resolve_profile_view(
        &self,
        session_id: &str,
        token_id: &str,
    ) -> Result<ProjectedUser, ServiceError> {
        let bound_session = self
            .tokens
            .validate(token_id, PROFILE_VIEW_PURPOSE)
            .await?;
        if bound_session != session_id {
            tracing::warn!("Profile view token presented for another session");
            return Err(ServiceError::InvalidToken);
        }

        let session = match self.sessions.get(session_id).await {
            Ok(session) => session,
            Err(ServiceError::NotFound(_)) => return Err(ServiceError::InvalidToken),
            Err(err) => return Err(err),
        };

        self.users.get(&session.user_id, AccessScope::Public).await
    }

    /// Deletes a user and invalidates every session they still hold.
    #[instrument(skip(self))]
    pub async fn remove_user(&self, user_id: &str) -> Result<(), ServiceError> {
        self.users.delete(user_id).await?;
        let removed = self.sessions.delete_for_user(user_id).await?;
        tracing::info!(sessions_removed = removed, "User removed");
        Ok(())
    }
}
