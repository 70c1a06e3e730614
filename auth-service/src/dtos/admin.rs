use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::ProjectedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Generated when omitted.
    #[schema(example = "U1")]
    pub id: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "a@x.com")]
    pub mail: String,

    #[validate(length(min = 1, message = "First name is required"))]
    #[schema(example = "Ada")]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    #[schema(example = "Lovelace")]
    pub last_name: String,

    #[validate(length(min = 1, message = "Display name is required"))]
    #[schema(example = "Ada L.")]
    pub display_name: String,

    #[schema(example = "Engineer")]
    pub position: Option<String>,

    /// Digits only.
    #[schema(example = "1234")]
    pub pin: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "password123", min_length = 8)]
    pub password: String,

    #[serde(default)]
    pub resources: Vec<String>,
}

/// Full replacement of a user. The secret hash is kept unless a new password is given.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "a@x.com")]
    pub mail: String,

    #[validate(length(min = 1, message = "First name is required"))]
    #[schema(example = "Ada")]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    #[schema(example = "Lovelace")]
    pub last_name: String,

    #[validate(length(min = 1, message = "Display name is required"))]
    #[schema(example = "Ada L.")]
    pub display_name: String,

    pub position: Option<String>,

    pub pin: Option<String>,

    pub password: Option<String>,

    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserResponse {
    #[schema(example = "U1")]
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListUsersResponse {
    pub users: Vec<ProjectedUser>,
    #[schema(example = 1)]
    pub total: usize,
}
