//! Single-use, purpose-scoped tokens bound to a session.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::instrument;

use crate::models::Token;
use crate::services::metrics;
use crate::services::store::{SessionRepository, TokenRepository};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct TokenIssuer {
    tokens: Arc<dyn TokenRepository>,
    sessions: Arc<dyn SessionRepository>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        sessions: Arc<dyn SessionRepository>,
        ttl: Duration,
    ) -> Self {
        Self {
            tokens,
            sessions,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[instrument(skip(self))]
    pub async fn issue(&self, session_id: &str, purpose: &str) -> Result<Token, ServiceError> {
        if self.sessions.find_session(session_id).await?.is_none() {
            return Err(ServiceError::NotFound("Session"));
        }

        let token = Token::new(session_id.to_string(), purpose.to_string(), self.ttl);
        self.tokens.insert_token(&token).await?;
        tracing::debug!(expires_at = %token.expires_at, "Token issued");
        Ok(token)
    }

    /// Consumes the token and returns the session it is bound to.
    ///
    /// The token is taken out of the store before any other check, so of several
    /// concurrent calls at most one sees it. Unknown, expired and already used tokens,
    /// tokens minted for another purpose and tokens whose session is gone all fail with
    /// `InvalidToken`; the token is spent either way.
    #[instrument(skip(self, token_id))]
    pub async fn validate(&self, token_id: &str, purpose: &str) -> Result<String, ServiceError> {
        let result = self.consume(token_id, purpose).await;
        metrics::record_token_validation(result.is_ok());
        result
    }

    async fn consume(&self, token_id: &str, purpose: &str) -> Result<String, ServiceError> {
        let Some(token) = self.tokens.take_token(token_id).await? else {
            return Err(ServiceError::InvalidToken);
        };

        if token.is_expired_at(Utc::now()) {
            tracing::debug!(session_id = %token.session_id, "Expired token presented");
            return Err(ServiceError::InvalidToken);
        }

        if token.purpose != purpose {
            tracing::warn!(
                session_id = %token.session_id,
                issued_for = %token.purpose,
                "Token presented for another purpose"
            );
            return Err(ServiceError::InvalidToken);
        }

        if self.sessions.find_session(&token.session_id).await?.is_none() {
            tracing::debug!(session_id = %token.session_id, "Token bound to a removed session");
            return Err(ServiceError::InvalidToken);
        }

        Ok(token.session_id)
    }

    /// Drops tokens that expired without ever being validated.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        self.tokens.delete_tokens_expired_at(now).await
    }
}
