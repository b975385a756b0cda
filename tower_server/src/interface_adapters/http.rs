// Shared HTTP response types for consistent API error payloads.

use axum::{Json, http::StatusCode};

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string for consistent JSON error responses.
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

// Helper to build a JSON error response.
pub fn error_response(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}
