use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Session, Token};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: String,

    /// The password for `hash` logins, the PIN for `pin` logins.
    #[validate(length(min = 1, message = "Credential is required"))]
    #[schema(example = "password123")]
    pub credential: String,

    /// `hash` (default) or `pin`.
    #[serde(default = "default_kind")]
    #[schema(example = "hash")]
    pub kind: String,
}

fn default_kind() -> String {
    "hash".to_string()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    #[schema(example = "9f2c...e1")]
    pub session_id: String,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id,
            user_id: session.user_id,
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SessionRequest {
    #[validate(length(min = 1, message = "Session id is required"))]
    #[schema(example = "9f2c...e1")]
    pub session_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: String,

    #[validate(length(min = 1, message = "Current password is required"))]
    #[schema(example = "password123")]
    pub old_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "new-password-456", min_length = 8)]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IssueTokenRequest {
    #[validate(length(min = 1, message = "Session id is required"))]
    #[schema(example = "9f2c...e1")]
    pub session_id: String,

    #[validate(length(min = 1, max = 64, message = "Purpose must be 1-64 characters"))]
    #[schema(example = "profile-view")]
    pub purpose: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "4be1...07")]
    pub token: String,
    pub session_id: String,
    #[schema(example = "profile-view")]
    pub purpose: String,
    #[schema(value_type = String, format = "date-time")]
    pub expires_at: DateTime<Utc>,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        Self {
            token: token.id,
            session_id: token.session_id,
            purpose: token.purpose,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PopupResponse {
    #[schema(example = "Profile")]
    pub title: String,
    #[schema(example = "https://auth.example.com/profile/view?sid=9f2c...e1&token=4be1...07")]
    pub frame_url: String,
    #[schema(example = "auth-service")]
    pub service_id: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfileViewQuery {
    #[validate(length(min = 1, message = "Session id is required"))]
    #[param(example = "9f2c...e1")]
    pub sid: String,

    #[validate(length(min = 1, message = "Token is required"))]
    #[param(example = "4be1...07")]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logged out")]
    pub message: String,
}
