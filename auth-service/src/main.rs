use auth_service::{
    build_router,
    config::{AuthConfig, StoreBackend},
    services::{
        DisplayProvider, HeartbeatSender, HttpDisplayClient, LoggingDisplay, MemoryStore, MongoDb,
        Persistence,
    },
    AppState,
};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        backend = ?config.store.backend,
        "Starting authentication service"
    );

    // An unreachable store is fatal: the error propagates out of main.
    let persistence = match config.store.backend {
        StoreBackend::MongoDb => {
            let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
            db.initialize_indexes().await?;
            tracing::info!("Database initialized successfully");
            Persistence::from_backend(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Persistence::from_backend(Arc::new(MemoryStore::new()))
        }
    };

    let display: Arc<dyn DisplayProvider> = match &config.display.service_url {
        Some(url) => Arc::new(HttpDisplayClient::new(url)?),
        None => {
            tracing::warn!("DISPLAY_SERVICE_URL not set; profile popups are only logged");
            Arc::new(LoggingDisplay)
        }
    };

    let state = AppState::new(config.clone(), persistence, display)?;
    tracing::info!(
        algorithm = ?state.codec.algorithm(),
        token_ttl_seconds = config.token.ttl_seconds,
        "Credential codec and token issuer ready"
    );

    let shutdown = CancellationToken::new();
    let mut background = Vec::new();

    match state.purge_task() {
        Some(task) => background.push(task.spawn(shutdown.clone())),
        None => tracing::info!("SESSION_MAX_AGE_HOURS is 0; session purge disabled"),
    }
    background.push(
        HeartbeatSender::new(&config.heartbeat, config.service_name.clone()).spawn(shutdown.clone()),
    );

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    let grace = Duration::from_secs(config.common.shutdown_grace_seconds);
    if tokio::time::timeout(grace, futures::future::join_all(background))
        .await
        .is_err()
    {
        tracing::warn!("Background tasks did not stop within the grace period");
    }

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    shutdown.cancel();
}
