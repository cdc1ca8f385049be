//! Mapping of service failures onto HTTP responses.

use agro_registry_domain::ServiceError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Handler error: a `ServiceError` rendered as a JSON body.
#[derive(Debug)]
pub(crate) struct ApiError(pub(crate) ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        match self.0 {
            ServiceError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "not_found", "message": message })),
            )
                .into_response(),
            ServiceError::Conflict => (
                StatusCode::CONFLICT,
                Json(serde_json::json!({ "error": "conflict", "message": message })),
            )
                .into_response(),
            ServiceError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "validation",
                    "field": field,
                    "message": message,
                })),
            )
                .into_response(),
            ServiceError::Store(detail) => {
                tracing::error!(error = %detail, "Store failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "error": "internal",
                        "message": "internal server error",
                    })),
                )
                    .into_response()
            }
        }
    }
}
