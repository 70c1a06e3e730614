//! Extractors that deserialize and then run `validator` rules.
//!
//! Malformed input is a 400; input that parses but breaks a rule is a 422 carrying the
//! field-level messages.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::dtos::ErrorResponse;

pub struct ValidatedJson<T>(pub T);

pub struct ValidatedQuery<T>(pub T);

fn reject(status: StatusCode, error: String) -> Response {
    tracing::debug!(status = %status, error = %error, "Request rejected");
    (status, Json(ErrorResponse { error })).into_response()
}

fn invalid(errors: ValidationErrors) -> Response {
    let messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    reject(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Validation error: {}", messages.join("; ")),
    )
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Json parse error: {}", e)))?;

        value.validate().map_err(invalid)?;
        Ok(ValidatedJson(value))
    }
}

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Query parse error: {}", e)))?;

        value.validate().map_err(invalid)?;
        Ok(ValidatedQuery(value))
    }
}
