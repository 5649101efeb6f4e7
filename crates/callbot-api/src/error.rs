//! Error type for the admin API

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use callbot_payments::PaymentsError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// callbot-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("Payments are not configured")]
    PaymentsUnavailable,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Core(callbot_core::Error),

    #[error(transparent)]
    Payments(PaymentsError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PaymentsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            // The dashboard only distinguishes success from failure.
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<callbot_core::Error> for ApiError {
    fn from(err: callbot_core::Error) -> Self {
        match err {
            err @ callbot_core::Error::NotFound { .. } => ApiError::NotFound(err.to_string()),
            other => ApiError::Core(other),
        }
    }
}

impl From<PaymentsError> for ApiError {
    fn from(err: PaymentsError) -> Self {
        match err {
            PaymentsError::NotConfigured => ApiError::PaymentsUnavailable,
            other => ApiError::Payments(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("API error: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = callbot_core::Error::NotFound {
            kind: "product",
            id: "7".to_string(),
        }
        .into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "product not found: 7");

        let invalid: ApiError = callbot_core::Error::Validation("bad".to_string()).into();
        assert_eq!(invalid.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let payments: ApiError = PaymentsError::NotConfigured.into();
        assert_eq!(payments.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
