use crate::domain::error::CoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Newtype over the domain error so the adapter layer owns the HTTP
/// mapping. Operational errors surface their message with a stable code;
/// internal failures are logged in full and surfaced generically.
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            CoreError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            CoreError::Auth(msg) => (StatusCode::FORBIDDEN, "auth_error", msg.clone()),
            CoreError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            CoreError::SignatureRejected(_) => (
                StatusCode::BAD_REQUEST,
                "webhook_error",
                "invalid webhook signature".to_string(),
            ),
            CoreError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            CoreError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            CoreError::External(err) => {
                tracing::error!("external collaborator error: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "external_error",
                    "upstream failure".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
