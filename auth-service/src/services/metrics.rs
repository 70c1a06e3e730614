use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub logins_total: IntCounterVec,
    pub token_validations_total: IntCounterVec,
    pub sessions_purged_total: IntCounter,
    pub tokens_purged_total: IntCounter,
    pub purge_failures_total: IntCounter,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Registers every collector. Calling it again after a successful run is a no-op.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let http_request_duration_seconds = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let logins_total = IntCounterVec::new(
        Opts::new("auth_logins_total", "Login attempts by credential kind and outcome"),
        &["kind", "outcome"],
    )?;
    let token_validations_total = IntCounterVec::new(
        Opts::new("auth_token_validations_total", "Token validations by outcome"),
        &["outcome"],
    )?;
    let sessions_purged_total =
        IntCounter::new("auth_sessions_purged_total", "Sessions removed by the purge sweep")?;
    let tokens_purged_total =
        IntCounter::new("auth_tokens_purged_total", "Expired tokens removed by the purge sweep")?;
    let purge_failures_total =
        IntCounter::new("auth_purge_failures_total", "Purge sweeps that failed")?;

    registry.register(Box::new(http_requests_total.clone()))?;
    registry.register(Box::new(http_request_duration_seconds.clone()))?;
    registry.register(Box::new(logins_total.clone()))?;
    registry.register(Box::new(token_validations_total.clone()))?;
    registry.register(Box::new(sessions_purged_total.clone()))?;
    registry.register(Box::new(tokens_purged_total.clone()))?;
    registry.register(Box::new(purge_failures_total.clone()))?;

    // A concurrent initializer may have won; its collectors are equivalent.
    let _ = METRICS.set(Metrics {
        registry,
        http_requests_total,
        http_request_duration_seconds,
        logins_total,
        token_validations_total,
        sessions_purged_total,
        tokens_purged_total,
        purge_failures_total,
    });
    Ok(())
}

pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

pub fn record_login(kind: &str, success: bool) {
    if let Some(m) = metrics() {
        m.logins_total.with_label_values(&[kind, outcome(success)]).inc();
    }
}

pub fn record_token_validation(success: bool) {
    if let Some(m) = metrics() {
        m.token_validations_total
            .with_label_values(&[outcome(success)])
            .inc();
    }
}

pub fn record_purge(sessions: u64, tokens: u64) {
    if let Some(m) = metrics() {
        m.sessions_purged_total.inc_by(sessions);
        m.tokens_purged_total.inc_by(tokens);
    }
}

pub fn record_purge_failure() {
    if let Some(m) = metrics() {
        m.purge_failures_total.inc();
    }
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match METRICS.get() {
        Some(m) => &m.registry,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}
