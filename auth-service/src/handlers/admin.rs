//! User provisioning behind the admin API key. Reads use the confidential scope.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::admin::{CreateUserRequest, CreateUserResponse, ListUsersResponse, UpdateUserRequest};
use crate::dtos::ErrorResponse;
use crate::models::{AccessScope, NewUser, ProjectedUser, User};
use crate::services::ServiceError;
use crate::utils::ValidatedJson;
use crate::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

/// An empty optional field means "no value", not an empty string.
fn cleared_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Mail already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("admin_api_key" = [])
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = state
        .coordinator
        .users()
        .create(NewUser {
            id: req.id,
            mail: req.mail,
            first_name: req.first_name,
            last_name: req.last_name,
            display_name: req.display_name,
            position: cleared_if_empty(req.position),
            pin: cleared_if_empty(req.pin),
            secret_hash: state.codec.hash(&req.password),
            resources: req.resources,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CreateUserResponse { id })))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All users", body = ListUsersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("admin_api_key" = [])
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state
        .coordinator
        .users()
        .list(AccessScope::Confidential)
        .await?;
    let total = users.len();
    Ok(Json(ListUsersResponse { users, total }))
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User", body = ProjectedUser),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("admin_api_key" = [])
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .coordinator
        .users()
        .get(&id, AccessScope::Confidential)
        .await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 204, description = "User replaced"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Mail already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("admin_api_key" = [])
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.coordinator.users();

    let secret_hash = match req.password.as_deref() {
        Some(password) if password.len() < MIN_PASSWORD_LENGTH => {
            return Err(ServiceError::validation(
                "password",
                "Password must be at least 8 characters",
            )
            .into());
        }
        Some(password) => state.codec.hash(password),
        None => users.find(&id).await?.secret_hash,
    };

    users
        .update(User {
            id,
            mail: req.mail,
            first_name: req.first_name,
            last_name: req.last_name,
            display_name: req.display_name,
            position: cleared_if_empty(req.position),
            pin: cleared_if_empty(req.pin),
            secret_hash,
            resources: req.resources,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User removed and their sessions closed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("admin_api_key" = [])
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.coordinator.remove_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
