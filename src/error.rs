//! Error types for the gateway
//!
//! Provides unified error handling using thiserror. Every gateway error maps to
//! the JSON envelope `{ error, message, retryable }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Model Error Enum ==
/// Failures of the remote generation call. All of them are retried.
#[derive(Error, Debug)]
pub enum ModelError {
    /// No API key was configured
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    /// The HTTP request itself failed
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// The API answered with a non-success status
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered 2xx with a body we could not read
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ModelError {
    /// Drops the request URL, which carries the API key as a query parameter.
    fn from(err: reqwest::Error) -> Self {
        ModelError::Transport(err.without_url())
    }
}

// == Gateway Error Enum ==
/// Unified error type for request handling.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Body is missing or not a JSON object
    #[error("Request body must be JSON")]
    InvalidJson,

    /// Missing or malformed input, oversized image, unparseable model output
    #[error("{0}")]
    BadRequest(String),

    /// No route for the path
    #[error("Unknown endpoint")]
    NotFound,

    /// Route exists but the method is not POST
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Remote model failed on every attempt
    #[error("Gemini request failed: {0}")]
    Upstream(#[from] ModelError),
}

impl GatewayError {
    /// Stable machine-readable code for the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::InvalidJson => "invalid_json",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::NotFound => "not_found",
            GatewayError::MethodNotAllowed => "method_not_allowed",
            GatewayError::Upstream(_) => "gemini_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidJson | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message returned to the client. Upstream details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            GatewayError::Upstream(_) => "Gemini request failed. Please retry.".to_string(),
            other => other.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Upstream(source) = &self {
            error!(error = %source, "Remote model call failed after retries");
        }

        let status = self.status();
        let body = ErrorResponse::new(self.code(), self.client_message());

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_statuses() {
        let cases = vec![
            (GatewayError::InvalidJson, "invalid_json", StatusCode::BAD_REQUEST),
            (
                GatewayError::BadRequest("image_base64 is required".to_string()),
                "bad_request",
                StatusCode::BAD_REQUEST,
            ),
            (GatewayError::NotFound, "not_found", StatusCode::NOT_FOUND),
            (
                GatewayError::MethodNotAllowed,
                "method_not_allowed",
                StatusCode::METHOD_NOT_ALLOWED,
            ),
            (
                GatewayError::Upstream(ModelError::MissingApiKey),
                "gemini_failed",
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status(), status);
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_upstream_message_is_generic() {
        let error = GatewayError::Upstream(ModelError::Api {
            status: 500,
            message: "internal detail".to_string(),
        });
        assert_eq!(error.client_message(), "Gemini request failed. Please retry.");
    }

    #[test]
    fn test_bad_request_message_is_passed_through() {
        let error = GatewayError::BadRequest("image exceeds max size".to_string());
        assert_eq!(error.client_message(), "image exceeds max size");
    }
}
