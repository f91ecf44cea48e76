//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Collapses every authorization failure into one 401 response so callers
//! cannot tell a bad password from a malformed scope or a broken key file.
//!
//! # Security considerations
//! - The specific failure is logged server-side only.
//! - Response bodies carry a fixed message.
use crate::api::types::ErrorResponse;
use crate::auth::AuthError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

const UNAUTHORIZED_MESSAGE: &str = "authentication required";

/// Structured API error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build a 401 Unauthorized error.
///
/// # What it does
/// Returns an `ApiError` with code `unauthorized`.
///
/// # Errors
/// - Does not fail.
pub fn api_unauthorized(message: &str) -> ApiError {
    // Authentication or authorization failed.
    ApiError {
        status: StatusCode::UNAUTHORIZED,
        body: ErrorResponse {
            code: "unauthorized".to_string(),
            message: message.to_string(),
        },
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::Store(_) | AuthError::Token(_) => {
                tracing::error!(error = %err, outcome = err.outcome(), "token request failed");
            }
            _ => {
                tracing::info!(error = %err, outcome = err.outcome(), "token request rejected");
            }
        }
        api_unauthorized(UNAUTHORIZED_MESSAGE)
    }
}
