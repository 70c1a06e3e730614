use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::auth::{PopupResponse, ProfileViewQuery, SessionRequest};
use crate::dtos::ErrorResponse;
use crate::models::ProjectedUser;
use crate::utils::{ValidatedJson, ValidatedQuery};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/profile/show",
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Popup handed to the display service", body = PopupResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 502, description = "Display service failed", body = ErrorResponse)
    ),
    tag = "Profile"
)]
pub async fn show_profile(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let popup = state.coordinator.show_profile(&req.session_id).await?;
    Ok(Json(PopupResponse {
        title: popup.title,
        frame_url: popup.frame_url,
        service_id: popup.service_id,
    }))
}

/// Target of the popup frame. Consumes the token.
#[utoipa::path(
    get,
    path = "/profile/view",
    params(ProfileViewQuery),
    responses(
        (status = 200, description = "Public profile", body = ProjectedUser),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "Profile"
)]
pub async fn view_profile(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ProfileViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .coordinator
        .resolve_profile_view(&query.sid, &query.token)
        .await?;
    Ok(Json(profile))
}
