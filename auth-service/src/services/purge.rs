//! Periodic removal of old sessions and unused expired tokens.
//!
//! Runs as its own task, independent of request handling. A failed sweep is logged
//! and the next tick tries again.

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::services::metrics;
use crate::services::sessions::SessionStore;
use crate::services::tokens::TokenIssuer;
use crate::services::ServiceError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub sessions: u64,
    pub tokens: u64,
}

#[derive(Clone)]
pub struct PurgeTask {
    sessions: SessionStore,
    tokens: TokenIssuer,
    max_age: ChronoDuration,
    interval: Duration,
}

impl PurgeTask {
    pub fn new(
        sessions: SessionStore,
        tokens: TokenIssuer,
        max_age: ChronoDuration,
        interval: Duration,
    ) -> Self {
        Self {
            sessions,
            tokens,
            max_age,
            interval,
        }
    }

    /// One sweep: sessions created before `now - max_age`, then expired tokens.
    pub async fn run_once(&self) -> Result<PurgeReport, ServiceError> {
        let now = Utc::now();
        let sessions = self.sessions.purge_older_than(now - self.max_age).await?;
        let tokens = self.tokens.purge_expired(now).await?;
        Ok(PurgeReport { sessions, tokens })
    }

    /// Starts the sweep loop. The first sweep runs immediately.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(
                interval_seconds = self.interval.as_secs(),
                max_age_hours = self.max_age.num_hours(),
                "Session purge task started"
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Session purge task stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        match self.run_once().await {
                            Ok(report) if report.sessions > 0 || report.tokens > 0 => {
                                metrics::record_purge(report.sessions, report.tokens);
                                tracing::info!(
                                    sessions = report.sessions,
                                    tokens = report.tokens,
                                    "Purged expired sessions and tokens"
                                );
                            }
                            Ok(_) => {
                                tracing::debug!("Purge sweep found nothing to remove");
                            }
                            Err(e) => {
                                metrics::record_purge_failure();
                                tracing::warn!(error = %e, "Purge sweep failed");
                            }
                        }
                    }
                }
            }
        })
    }
}
