//! Periodic liveness signal. Never coupled to request handling.

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::HeartbeatConfig;

#[derive(Debug, Serialize)]
struct Heartbeat<'a> {
    service: &'a str,
    status: &'a str,
    timestamp: String,
}

#[derive(Clone)]
pub struct HeartbeatSender {
    client: Client,
    url: Option<String>,
    service: String,
    interval: Duration,
}

impl HeartbeatSender {
    pub fn new(config: &HeartbeatConfig, service: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
            service: service.into(),
            interval: Duration::from_secs(config.interval_seconds),
        }
    }

    /// Emits one heartbeat. Delivery failures are logged and swallowed.
    pub async fn beat(&self) {
        let Some(url) = &self.url else {
            tracing::debug!(service = %self.service, "heartbeat");
            return;
        };

        let body = Heartbeat {
            service: &self.service,
            status: "up",
            timestamp: Utc::now().to_rfc3339(),
        };

        match self.client.post(url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %url, "Heartbeat delivered");
            }
            Ok(response) => {
                tracing::warn!(url = %url, status = %response.status(), "Heartbeat rejected");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Heartbeat delivery failed");
            }
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => self.beat().await,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn beat_without_url_only_logs() {
        let sender = HeartbeatSender::new(
            &HeartbeatConfig {
                url: None,
                interval_seconds: 1,
            },
            "auth-service",
        );
        sender.beat().await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_does_not_fail() {
        let sender = HeartbeatSender::new(
            &HeartbeatConfig {
                url: Some("http://127.0.0.1:9/heartbeat".to_string()),
                interval_seconds: 1,
            },
            "auth-service",
        );
        sender.beat().await;
    }

    #[tokio::test]
    async fn spawned_sender_stops_on_cancel() {
        let sender = HeartbeatSender::new(
            &HeartbeatConfig {
                url: None,
                interval_seconds: 60,
            },
            "auth-service",
        );
        let shutdown = CancellationToken::new();
        let handle = sender.spawn(shutdown.clone());
        shutdown.cancel();
        handle.await.expect("heartbeat task joins");
    }
}
