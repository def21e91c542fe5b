use axum::Json;
use axum::response::Response;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

use ultra_core::HttpError;
use ultra_readiness::ReadinessSnapshot;

/// Errors raised at the HTTP boundary itself, before a pipeline
/// execution exists to carry the error — request validation, readiness
/// denial, and unexpected invariant violations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),
    #[error("no selected model is currently available")]
    NotReady(ReadinessSnapshot),
    #[error("internal error, incident {0}")]
    Internal(String),
}

impl HttpError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotReady(_) => "no_available_models",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

impl ServerError {
    /// Structured `error.detail` payload for this variant — the
    /// readiness snapshot for `NotReady`, otherwise `null`.
    #[must_use]
    pub fn detail(&self) -> serde_json::Value {
        match self {
            Self::NotReady(snapshot) => json!(snapshot),
            Self::Validation(_) | Self::Internal(_) => serde_json::Value::Null,
        }
    }
}

/// Render any [`HttpError`] implementor plus a known `correlation_id`
/// into the surfaced error envelope.
#[must_use]
pub fn error_response(correlation_id: &str, error: &dyn HttpError, detail: serde_json::Value) -> Response {
    use axum::response::IntoResponse;

    let body = json!({
        "correlation_id": correlation_id,
        "status": "error",
        "error": {
            "code": error.error_type(),
            "message": error.client_message(),
            "detail": detail,
        },
    });
    (error.status_code(), Json(body)).into_response()
}
