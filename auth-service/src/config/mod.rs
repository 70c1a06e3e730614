use chrono::Duration;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Upper bound for `TOKEN_TTL_SECONDS`: one day.
pub const MAX_TOKEN_TTL_SECONDS: i64 = 86_400;
/// Upper bound for `SESSION_MAX_AGE_HOURS`: ten years.
pub const MAX_SESSION_AGE_HOURS: i64 = 87_600;
/// Upper bound for the purge and heartbeat intervals: one week.
pub const MAX_INTERVAL_SECONDS: u64 = 604_800;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub mongodb: MongoConfig,
    pub session: SessionConfig,
    pub token: TokenConfig,
    pub credentials: CredentialConfig,
    pub display: DisplayConfig,
    pub heartbeat: HeartbeatConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sessions older than this are purged. Zero disables the purge task.
    pub max_age_hours: i64,
    pub purge_interval_seconds: u64,
}

impl SessionConfig {
    /// Maximum session age, or `None` when outside `0..=MAX_SESSION_AGE_HOURS`.
    pub fn max_age(&self) -> Option<Duration> {
        if (0..=MAX_SESSION_AGE_HOURS).contains(&self.max_age_hours) {
            Duration::try_hours(self.max_age_hours)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub ttl_seconds: i64,
}

impl TokenConfig {
    /// Token lifetime, or `None` when outside `1..=MAX_TOKEN_TTL_SECONDS`.
    pub fn ttl(&self) -> Option<Duration> {
        if (1..=MAX_TOKEN_TTL_SECONDS).contains(&self.ttl_seconds) {
            Duration::try_seconds(self.ttl_seconds)
        } else {
            None
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct CredentialConfig {
    pub algorithm: String,
    pub salt: String,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("algorithm", &self.algorithm)
            .field("salt", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Base URL of the display service. Popups are only logged when unset.
    pub service_url: Option<String>,
    /// Externally reachable base URL of this service, used to build frame URLs.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatConfig {
    pub url: Option<String>,
    pub interval_seconds: u64,
}

#[derive(Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub admin_api_key: String,
}

/// Per-IP budget for the credential-checking routes (`/auth/login`, `/auth/password`).
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("allowed_origins", &self.allowed_origins)
            .field("admin_api_key", &"<redacted>")
            .finish()
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_vars(common_config, |key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_vars<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Environment = lookup("ENVIRONMENT")
            .unwrap_or_else(|| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let get = |key: &str, default: Option<&str>, required: bool| {
            get_env(&lookup, key, default, required)
        };

        let backend: StoreBackend = get("STORE_BACKEND", Some("mongodb"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let mongo_required = is_prod && backend == StoreBackend::MongoDb;

        let config = AuthConfig {
            common,
            environment: environment.clone(),
            service_name: get("SERVICE_NAME", Some("auth-service"), false)?,
            service_version: get("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: get("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.is_empty()),
            store: StoreConfig { backend },
            mongodb: MongoConfig {
                uri: get("MONGODB_URI", Some("mongodb://localhost:27017"), mongo_required)?,
                database: get("MONGODB_DATABASE", Some("auth"), mongo_required)?,
            },
            session: SessionConfig {
                max_age_hours: parse_number(
                    get("SESSION_MAX_AGE_HOURS", Some("24"), false)?,
                    "SESSION_MAX_AGE_HOURS",
                )?,
                purge_interval_seconds: parse_number(
                    get("SESSION_PURGE_INTERVAL_SECONDS", Some("3600"), false)?,
                    "SESSION_PURGE_INTERVAL_SECONDS",
                )?,
            },
            token: TokenConfig {
                ttl_seconds: parse_number(
                    get("TOKEN_TTL_SECONDS", Some("300"), false)?,
                    "TOKEN_TTL_SECONDS",
                )?,
            },
            credentials: CredentialConfig {
                algorithm: get("CREDENTIAL_ALGORITHM", Some("sha256"), false)?,
                salt: get("CREDENTIAL_SALT", Some(""), is_prod)?,
            },
            display: DisplayConfig {
                service_url: lookup("DISPLAY_SERVICE_URL").filter(|v| !v.is_empty()),
                public_base_url: get("PUBLIC_BASE_URL", Some("http://localhost:8080"), is_prod)?
                    .trim_end_matches('/')
                    .to_string(),
            },
            heartbeat: HeartbeatConfig {
                url: lookup("HEARTBEAT_URL").filter(|v| !v.is_empty()),
                interval_seconds: parse_number(
                    get("HEARTBEAT_INTERVAL_SECONDS", Some("30"), false)?,
                    "HEARTBEAT_INTERVAL_SECONDS",
                )?,
            },
            security: SecurityConfig {
                allowed_origins: get("ALLOWED_ORIGINS", Some("http://localhost:3000"), false)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                admin_api_key: get("ADMIN_API_KEY", None, true)?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_number(
                    get("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), false)?,
                    "RATE_LIMIT_LOGIN_ATTEMPTS",
                )?,
                login_window_seconds: parse_number(
                    get("RATE_LIMIT_LOGIN_WINDOW_SECONDS", Some("900"), false)?,
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.token.ttl().is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TOKEN_TTL_SECONDS must be between 1 and {}",
                MAX_TOKEN_TTL_SECONDS
            )));
        }

        if self.session.max_age().is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_MAX_AGE_HOURS must be between 0 and {}",
                MAX_SESSION_AGE_HOURS
            )));
        }

        if !(1..=MAX_INTERVAL_SECONDS).contains(&self.session.purge_interval_seconds) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_PURGE_INTERVAL_SECONDS must be between 1 and {}",
                MAX_INTERVAL_SECONDS
            )));
        }

        if !(1..=MAX_INTERVAL_SECONDS).contains(&self.heartbeat.interval_seconds) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "HEARTBEAT_INTERVAL_SECONDS must be between 1 and {}",
                MAX_INTERVAL_SECONDS
            )));
        }

        if self.rate_limit.login_attempts == 0 || self.rate_limit.login_window_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RATE_LIMIT_LOGIN_ATTEMPTS and RATE_LIMIT_LOGIN_WINDOW_SECONDS must be positive"
            )));
        }

        if self.security.admin_api_key.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ADMIN_API_KEY must not be empty"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.store.backend == StoreBackend::Memory {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "In-memory store backend is not allowed in production"
                )));
            }

            if self.credentials.salt.is_empty() {
                tracing::error!("CREDENTIAL_SALT is empty in production");
            }
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Prod
    }
}

fn get_env<F>(
    lookup: &F,
    key: &str,
    default: Option<&str>,
    required: bool,
) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if required {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_number<T>(value: String, key: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AuthConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuthConfig::from_vars(core_config::Config::default(), |key| vars.get(key).cloned())
    }

    #[test]
    fn dev_defaults_apply() {
        let config = load(&[("ADMIN_API_KEY", "key")]).expect("dev config loads");
        assert_eq!(config.environment, Environment::Dev);
        assert_eq!(config.store.backend, StoreBackend::MongoDb);
        assert_eq!(config.token.ttl_seconds, 300);
        assert_eq!(config.session.max_age_hours, 24);
        assert_eq!(config.session.purge_interval_seconds, 3600);
        assert_eq!(config.credentials.algorithm, "sha256");
        assert!(config.display.service_url.is_none());
        assert!(config.heartbeat.url.is_none());
        assert_eq!(config.security.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn admin_key_is_always_required() {
        assert!(matches!(load(&[]), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn prod_requires_explicit_settings() {
        let result = load(&[("ENVIRONMENT", "prod"), ("ADMIN_API_KEY", "key")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn prod_rejects_memory_backend() {
        let result = load(&[
            ("ENVIRONMENT", "prod"),
            ("ADMIN_API_KEY", "key"),
            ("STORE_BACKEND", "memory"),
            ("CREDENTIAL_SALT", "salt"),
            ("PUBLIC_BASE_URL", "https://auth.example.com"),
        ]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let result = load(&[("ADMIN_API_KEY", "key"), ("TOKEN_TTL_SECONDS", "soon")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));

        let result = load(&[("ADMIN_API_KEY", "key"), ("TOKEN_TTL_SECONDS", "0")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn oversized_durations_are_config_errors() {
        for (key, value) in [
            ("TOKEN_TTL_SECONDS", i64::MAX.to_string()),
            ("TOKEN_TTL_SECONDS", (MAX_TOKEN_TTL_SECONDS + 1).to_string()),
            ("SESSION_MAX_AGE_HOURS", i64::MAX.to_string()),
            ("SESSION_MAX_AGE_HOURS", "-1".to_string()),
            ("SESSION_PURGE_INTERVAL_SECONDS", u64::MAX.to_string()),
            ("HEARTBEAT_INTERVAL_SECONDS", u64::MAX.to_string()),
        ] {
            let result = load(&[("ADMIN_API_KEY", "key"), (key, value.as_str())]);
            assert!(
                matches!(result, Err(AppError::ConfigError(_))),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let config = load(&[
            ("ADMIN_API_KEY", "key"),
            ("TOKEN_TTL_SECONDS", "86400"),
            ("SESSION_MAX_AGE_HOURS", "87600"),
        ])
        .unwrap();
        assert_eq!(config.token.ttl(), Some(Duration::days(1)));
        assert_eq!(config.session.max_age(), Some(Duration::hours(MAX_SESSION_AGE_HOURS)));
    }

    #[test]
    fn rate_limit_defaults_and_zero_rejected() {
        let config = load(&[("ADMIN_API_KEY", "key")]).unwrap();
        assert_eq!(config.rate_limit.login_attempts, 5);
        assert_eq!(config.rate_limit.login_window_seconds, 900);

        let result = load(&[("ADMIN_API_KEY", "key"), ("RATE_LIMIT_LOGIN_ATTEMPTS", "0")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn public_base_url_drops_trailing_slash() {
        let config = load(&[
            ("ADMIN_API_KEY", "key"),
            ("PUBLIC_BASE_URL", "https://auth.example.com/"),
            ("STORE_BACKEND", "memory"),
        ])
        .unwrap();
        assert_eq!(config.display.public_base_url, "https://auth.example.com");
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = load(&[
            ("ADMIN_API_KEY", "top-secret"),
            ("CREDENTIAL_SALT", "pepper"),
        ])
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("top-secret"));
        assert!(!rendered.contains("pepper"));
    }
}
