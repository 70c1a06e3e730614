//! Test helper module for auth-service integration tests.
//!
//! Builds the full application state on the in-memory store with a recording
//! display service, so no external services are needed.

#![allow(dead_code)]

use auth_service::{
    build_router,
    config::AuthConfig,
    models::NewUser,
    services::{MemoryStore, MockDisplayService, Persistence},
    AppState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_ADMIN_API_KEY: &str = "test-admin-key-12345";
pub const TEST_PUBLIC_BASE_URL: &str = "http://auth.test";

pub fn test_config(overrides: &[(&str, &str)]) -> AuthConfig {
    let mut vars: HashMap<String, String> = [
        ("STORE_BACKEND", "memory"),
        ("ADMIN_API_KEY", TEST_ADMIN_API_KEY),
        ("CREDENTIAL_SALT", "test-salt"),
        ("PUBLIC_BASE_URL", TEST_PUBLIC_BASE_URL),
        ("LOG_LEVEL", "error"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }

    AuthConfig::from_vars(Default::default(), |key| vars.get(key).cloned())
        .expect("test configuration is valid")
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub display: MockDisplayService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(&[]))
    }

    pub fn with_config(config: AuthConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let display = MockDisplayService::new();
        let state = AppState::new(
            config,
            Persistence::from_backend(store.clone()),
            Arc::new(display.clone()),
        )
        .expect("state builds");

        Self {
            state,
            store,
            display,
        }
    }

    pub async fn router(&self) -> Router {
        build_router(self.state.clone())
            .await
            .expect("router builds")
    }

    pub fn hash(&self, secret: &str) -> String {
        self.state.codec.hash(secret)
    }

    /// Provisions a user whose secret is `password` (hashed with the service codec).
    pub async fn create_user(&self, id: &str, mail: &str, password: &str, pin: Option<&str>) -> String {
        self.state
            .coordinator
            .users()
            .create(NewUser {
                id: Some(id.to_string()),
                mail: mail.to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                display_name: "Ada L.".to_string(),
                position: Some("Engineer".to_string()),
                pin: pin.map(str::to_string),
                secret_hash: self.hash(password),
                resources: vec!["reports".to_string()],
            })
            .await
            .expect("user is created")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router()
            .await
            .oneshot(request)
            .await
            .expect("request is handled");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-admin-api-key", TEST_ADMIN_API_KEY);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
