use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value;

/// Outcome tag carried by every response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Error,
    NotFound,
    FailedValidation,
    Unauthorized,
}

impl Status {
    /// Validation failures ride on a success-level HTTP code; input
    /// rejection is an application outcome, not a transport failure.
    pub fn http_code(&self) -> StatusCode {
        match self {
            Status::Success => StatusCode::OK,
            Status::FailedValidation => StatusCode::OK,
            Status::NotFound => StatusCode::NOT_FOUND,
            Status::Unauthorized => StatusCode::UNAUTHORIZED,
            Status::Error => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Fixed-shape result wrapper used by every handler.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Envelope {
    pub fn new(status: Status, payload: Option<Value>) -> Self {
        Self { status, payload }
    }

    pub fn success(payload: Value) -> Self {
        Self::new(Status::Success, Some(payload))
    }

    pub fn success_empty() -> Self {
        Self::new(Status::Success, None)
    }

    pub fn not_found() -> Self {
        Self::new(Status::NotFound, None)
    }

    pub fn not_found_with(payload: Value) -> Self {
        Self::new(Status::NotFound, Some(payload))
    }

    pub fn failed_validation(payload: Value) -> Self {
        Self::new(Status::FailedValidation, Some(payload))
    }

    pub fn failed_validation_empty() -> Self {
        Self::new(Status::FailedValidation, None)
    }

    pub fn unauthorized(payload: Value) -> Self {
        Self::new(Status::Unauthorized, Some(payload))
    }

    pub fn unauthorized_empty() -> Self {
        Self::new(Status::Unauthorized, None)
    }

    pub fn error(payload: Value) -> Self {
        Self::new(Status::Error, Some(payload))
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status.http_code(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_serializes_screaming_snake() {
        let body = serde_json::to_value(Envelope::failed_validation(json!([]))).unwrap();
        assert_eq!(body["status"], "FAILED_VALIDATION");

        let body = serde_json::to_value(Envelope::not_found()).unwrap();
        assert_eq!(body["status"], "NOT_FOUND");
    }

    #[test]
    fn empty_payload_is_omitted() {
        let body = serde_json::to_value(Envelope::success_empty()).unwrap();
        assert!(body.get("payload").is_none());

        let body = serde_json::to_value(Envelope::success(json!({"id": 1}))).unwrap();
        assert_eq!(body["payload"]["id"], 1);
    }

    #[test]
    fn http_codes_follow_status() {
        assert_eq!(Status::Success.http_code(), StatusCode::OK);
        assert_eq!(Status::FailedValidation.http_code(), StatusCode::OK);
        assert_eq!(Status::NotFound.http_code(), StatusCode::NOT_FOUND);
        assert_eq!(Status::Unauthorized.http_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Status::Error.http_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
