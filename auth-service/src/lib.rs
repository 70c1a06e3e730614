pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{
    create_ip_rate_limiter, ip_rate_limit_middleware, request_id_middleware, IpRateLimiter,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::{AuthConfig, MAX_INTERVAL_SECONDS};
use crate::services::{
    AuthCoordinator, CredentialCodec, DisplayProvider, Persistence, PurgeTask, SessionStore,
    TokenIssuer, UserStore,
};
use service_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::metrics::metrics,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::change_password,
        handlers::auth::issue_token,
        handlers::profile::show_profile,
        handlers::profile::view_profile,
        handlers::admin::create_user,
        handlers::admin::list_users,
        handlers::admin::get_user,
        handlers::admin::update_user,
        handlers::admin::delete_user,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::LoginRequest,
            dtos::auth::SessionResponse,
            dtos::auth::SessionRequest,
            dtos::auth::ChangePasswordRequest,
            dtos::auth::IssueTokenRequest,
            dtos::auth::TokenResponse,
            dtos::auth::PopupResponse,
            dtos::auth::MessageResponse,
            dtos::admin::CreateUserRequest,
            dtos::admin::UpdateUserRequest,
            dtos::admin::CreateUserResponse,
            dtos::admin::ListUsersResponse,
            models::ProjectedUser,
            models::AccessScope,
            models::CredentialKind,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sessions, passwords and tokens"),
        (name = "Profile", description = "Cross-service profile popups"),
        (name = "Admin", description = "User provisioning"),
        (name = "Observability", description = "Health and metrics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                    middleware::ADMIN_API_KEY_HEADER,
                ))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub codec: CredentialCodec,
    pub coordinator: AuthCoordinator,
    pub persistence: Persistence,
    /// Shared by `/auth/login` and `/auth/password`, keyed by client IP.
    pub login_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wires the components over a persistence backend.
    ///
    /// Fails when the configured hashing algorithm is not available.
    pub fn new(
        config: AuthConfig,
        persistence: Persistence,
        display: Arc<dyn DisplayProvider>,
    ) -> Result<Self, AppError> {
        let codec = CredentialCodec::new(&config.credentials)?;
        let ttl = config.token.ttl().ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "TOKEN_TTL_SECONDS out of range: {}",
                config.token.ttl_seconds
            ))
        })?;

        let users = UserStore::new(persistence.users.clone());
        let sessions = SessionStore::new(persistence.sessions.clone());
        let tokens = TokenIssuer::new(
            persistence.tokens.clone(),
            persistence.sessions.clone(),
            ttl,
        );
        let coordinator = AuthCoordinator::new(
            users,
            sessions,
            tokens,
            display,
            config.service_name.clone(),
            config.display.public_base_url.clone(),
        );

        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        );

        Ok(Self {
            config,
            codec,
            coordinator,
            persistence,
            login_rate_limiter,
        })
    }

    /// The periodic sweep over this state's stores, or `None` when session expiry is
    /// switched off or its settings are out of range.
    pub fn purge_task(&self) -> Option<PurgeTask> {
        let session = &self.config.session;
        if session.max_age_hours == 0 {
            return None;
        }
        let interval = session.purge_interval_seconds;
        let max_age = match session.max_age() {
            Some(max_age) if (1..=MAX_INTERVAL_SECONDS).contains(&interval) => max_age,
            _ => {
                tracing::error!(
                    max_age_hours = session.max_age_hours,
                    purge_interval_seconds = interval,
                    "Session purge settings out of range; purge disabled"
                );
                return None;
            }
        };
        Some(PurgeTask::new(
            self.coordinator.sessions().clone(),
            self.coordinator.tokens().clone(),
            max_age,
            Duration::from_secs(interval),
        ))
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    services::metrics::init_metrics().map_err(|e| {
        tracing::error!("Failed to initialize metrics: {}", e);
        AppError::InternalError(anyhow::anyhow!("Failed to initialize metrics: {}", e))
    })?;

    let admin_routes = Router::new()
        .route(
            "/admin/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route(
            "/admin/users/:id",
            get(handlers::admin::get_user)
                .put(handlers::admin::update_user)
                .delete(handlers::admin::delete_user),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::admin_auth_middleware,
        ));

    // Credential checks, rate limited per client IP
    let credential_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/password", post(handlers::auth::change_password))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let allowed_origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect();

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/tokens", post(handlers::auth::issue_token))
        .route("/profile/show", post(handlers::profile::show_profile))
        .route("/profile/view", get(handlers::profile::view_profile))
        .merge(credential_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(middleware::ADMIN_API_KEY_HEADER),
                ]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Store is unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.persistence.health.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}
