//! Session and token endpoints.
//!
//! Raw secrets are hashed here, where they enter the service; everything behind the
//! coordinator only sees hash strings.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::auth::{
    ChangePasswordRequest, IssueTokenRequest, LoginRequest, MessageResponse, SessionRequest,
    SessionResponse, TokenResponse,
};
use crate::dtos::ErrorResponse;
use crate::models::CredentialKind;
use crate::services::ServiceError;
use crate::utils::ValidatedJson;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Session opened", body = SessionResponse),
        (status = 401, description = "Authentication failed", body = ErrorResponse),
        (status = 429, description = "Too many attempts from this IP", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kind: CredentialKind = req
        .kind
        .parse()
        .map_err(|e: String| ServiceError::validation("kind", e))?;

    let session = match kind {
        CredentialKind::Hash => {
            let hashed = state.codec.hash(&req.credential);
            state.coordinator.login(&req.user_id, &hashed).await?
        }
        CredentialKind::Pin => {
            state
                .coordinator
                .login_with_pin(&req.user_id, &req.credential)
                .await?
        }
    };

    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Session closed", body = MessageResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.coordinator.logout(&req.session_id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Authentication failed", body = ErrorResponse),
        (status = 429, description = "Too many attempts from this IP", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn change_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let old_hash = state.codec.hash(&req.old_password);
    let new_hash = state.codec.hash(&req.new_password);
    state
        .coordinator
        .change_password(&req.user_id, &old_hash, &new_hash)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/tokens",
    request_body = IssueTokenRequest,
    responses(
        (status = 201, description = "Token issued", body = TokenResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn issue_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<IssueTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .coordinator
        .issue_token(&req.session_id, &req.purpose)
        .await?;
    Ok((StatusCode::CREATED, Json(TokenResponse::from(token))))
}
