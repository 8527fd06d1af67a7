// HTTP API error types. Every failure a handler can produce funnels through
// ApiError so a request is terminated exactly once, with the standard envelope.
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::crypto::CipherError;
use crate::response::Envelope;
use crate::validate::FieldError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Unique-index violation surfaced as a validation failure. This is the
    /// store-native backstop behind the application-level duplicate checks.
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Crypto(#[from] CipherError),
}

impl ApiError {
    /// Map a driver error from an INSERT/UPDATE into a Duplicate when the
    /// failure is a unique violation on the given logical field.
    pub fn on_conflict(err: sqlx::Error, field: &'static str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                ApiError::Duplicate(field)
            }
            _ => ApiError::Store(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = match self {
            ApiError::Unauthorized(msg) => Envelope::unauthorized(json!({ "msg": msg })),
            ApiError::NotFound(msg) => Envelope::not_found_with(json!({ "msg": msg })),
            ApiError::Duplicate(field) => {
                Envelope::failed_validation(json!([FieldError::duplicate(field)]))
            }
            // Store errors surface the raw driver message; nothing is retried.
            ApiError::Store(err) => {
                tracing::error!("store error: {}", err);
                Envelope::error(json!({ "err": err.to_string() }))
            }
            ApiError::Crypto(err) => {
                tracing::error!("field cipher error: {}", err);
                Envelope::error(json!({ "err": err.to_string() }))
            }
        };
        envelope.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Status;
    use axum::response::IntoResponse;

    #[test]
    fn duplicate_maps_to_failed_validation() {
        let err = ApiError::Duplicate("name");
        let response = err.into_response();
        assert_eq!(response.status(), Status::FailedValidation.http_code());
    }

    #[test]
    fn not_found_keeps_404() {
        let response = ApiError::NotFound("Channel Not Found".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
