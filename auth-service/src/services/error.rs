use service_core::error::AppError;
use thiserror::Error;

/// Message shared by every authentication failure so that an unknown user and a
/// wrong credential look the same to the caller.
pub const UNAUTHORIZED_MESSAGE: &str = "Authentication failed";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict on {field}: {message}")]
    Conflict { field: &'static str, message: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Unsupported hashing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(err: mongodb::error::Error) -> Self {
        ServiceError::Storage(anyhow::Error::new(err))
    }
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Conflict {
            field,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::Conflict { field, message } => {
                AppError::Conflict(anyhow::anyhow!("{}: {}", field, message))
            }
            ServiceError::Validation { field, message } => {
                let mut error = validator::ValidationError::new("invalid");
                error.message = Some(message.into());
                let mut errors = validator::ValidationErrors::new();
                errors.add(field, error);
                AppError::ValidationError(errors)
            }
            ServiceError::Unauthorized => {
                AppError::Unauthorized(anyhow::anyhow!(UNAUTHORIZED_MESSAGE))
            }
            ServiceError::InvalidToken => AppError::InvalidToken(anyhow::anyhow!("Invalid token")),
            ServiceError::Storage(e) => AppError::DatabaseError(e),
            ServiceError::UnsupportedAlgorithm(name) => {
                AppError::ConfigError(anyhow::anyhow!("Unsupported hashing algorithm: {}", name))
            }
            ServiceError::Collaborator(e) => AppError::BadGateway(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::http::StatusCode;

    #[test]
    fn validation_errors_keep_the_field_name() {
        let app: AppError = ServiceError::validation("pin", "only digits").into();
        match app {
            AppError::ValidationError(errors) => {
                assert!(errors.field_errors().contains_key("pin"));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn unauthorized_is_a_single_shape() {
        let app: AppError = ServiceError::Unauthorized.into();
        assert_eq!(app.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::Unauthorized.to_string(), UNAUTHORIZED_MESSAGE);
    }

    #[test]
    fn storage_failures_map_to_database_errors() {
        let app: AppError = ServiceError::Storage(anyhow::anyhow!("io")).into();
        assert!(matches!(app, AppError::DatabaseError(_)));
    }
}
