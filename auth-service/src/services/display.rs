//! Cross-service display collaborator: asks another service to show a popup to the
//! user behind a session.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::instrument;

use crate::models::Popup;
use crate::services::ServiceError;

#[async_trait]
pub trait DisplayProvider: Send + Sync {
    async fn display_popup(&self, session_id: &str, popup: &Popup) -> Result<(), ServiceError>;
}

#[derive(Debug, Serialize)]
struct DisplayRequest<'a> {
    session_id: &'a str,
    #[serde(flatten)]
    popup: &'a Popup,
}

/// Posts popups as JSON to `{base_url}/popups`.
#[derive(Clone)]
pub struct HttpDisplayClient {
    client: Client,
    endpoint: String,
}

impl HttpDisplayClient {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::Collaborator(format!("Failed to build HTTP client: {}", e)))?;
        let endpoint = format!("{}/popups", base_url.trim_end_matches('/'));
        tracing::info!(endpoint = %endpoint, "Display service client configured");
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl DisplayProvider for HttpDisplayClient {
    #[instrument(skip(self, popup), fields(title = %popup.title))]
    async fn display_popup(&self, session_id: &str, popup: &Popup) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&DisplayRequest { session_id, popup })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Display service unreachable");
                ServiceError::Collaborator(format!("Display service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "Display service rejected popup");
            return Err(ServiceError::Collaborator(format!(
                "Display service returned {}",
                status
            )));
        }

        tracing::debug!("Popup delivered to display service");
        Ok(())
    }
}

/// Used when no display service is configured: the popup is only logged.
pub struct LoggingDisplay;

#[async_trait]
impl DisplayProvider for LoggingDisplay {
    async fn display_popup(&self, session_id: &str, popup: &Popup) -> Result<(), ServiceError> {
        tracing::info!(
            session_id = %session_id,
            title = %popup.title,
            frame_url = %popup.frame_url,
            "No display service configured; popup not forwarded"
        );
        Ok(())
    }
}

/// Records every popup it is asked to show. Can be switched to fail.
#[derive(Clone, Default)]
pub struct MockDisplayService {
    shown: Arc<Mutex<Vec<(String, Popup)>>>,
    failing: Arc<Mutex<bool>>,
}

impl MockDisplayService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }

    pub fn shown(&self) -> Vec<(String, Popup)> {
        self.shown
            .lock()
            .map(|shown| shown.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DisplayProvider for MockDisplayService {
    async fn display_popup(&self, session_id: &str, popup: &Popup) -> Result<(), ServiceError> {
        let failing = *self
            .failing
            .lock()
            .map_err(|_| ServiceError::Collaborator("mutex poisoned".to_string()))?;
        if failing {
            return Err(ServiceError::Collaborator("display service down".to_string()));
        }

        self.shown
            .lock()
            .map_err(|_| ServiceError::Collaborator("mutex poisoned".to_string()))?
            .push((session_id.to_string(), popup.clone()));
        Ok(())
    }
}
