//! Error handling module
//!
//! Defines the request-level error taxonomy and its HTTP status mapping.
//! Every variant renders as a JSON body of the form `{ "error": ..., ... }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors surfaced to clients by the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Required configuration is missing for the requested operation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The client sent a request the proxy cannot act on.
    #[error("{message}")]
    ClientRequest { status: StatusCode, message: String },

    /// The client failed authorization.
    #[error("Unauthorized")]
    Authorization,

    /// An outbound call failed or was rejected.
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        details: Option<Value>,
    },

    /// An outbound call exceeded its deadline.
    #[error("Upstream timed out after {0} seconds")]
    Timeout(u64),

    /// Anything unexpected. The detail is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::ClientRequest {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::ClientRequest {
            status: StatusCode::METHOD_NOT_ALLOWED,
            message: message.into(),
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Configuration(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::ClientRequest { status, .. } => *status,
            ProxyError::Authorization => StatusCode::UNAUTHORIZED,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// JSON body returned to the client.
    pub fn body(&self) -> Value {
        match self {
            ProxyError::Configuration(_) => json!({ "error": "Server is not configured for this operation" }),
            ProxyError::Internal(_) => json!({ "error": "Internal server error" }),
            ProxyError::Upstream {
                message,
                details: Some(details),
                status,
            } => json!({ "error": message, "status": status.as_u16(), "details": details }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: "Upstream request failed".to_string(),
            details: Some(Value::String(e.to_string())),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ProxyError::Configuration(detail) => {
                tracing::error!(error = %detail, "Request rejected: missing configuration")
            }
            ProxyError::Internal(detail) => tracing::error!(error = %detail, "Internal error"),
            ProxyError::Upstream { .. } | ProxyError::Timeout(_) => {
                tracing::warn!(status = %status, error = %self, "Upstream failure")
            }
            _ => tracing::debug!(status = %status, error = %self, "Client error"),
        }
        (status, Json(self.body())).into_response()
    }
}

/// Result type for request handling.
pub type ProxyResult<T> = Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::method_not_allowed("x").status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ProxyError::Authorization.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ProxyError::Configuration("zone".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ProxyError::Timeout(30).status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = ProxyError::Internal("database password leaked".into());
        let body = err.body();
        assert_eq!(body["error"], "Internal server error");
        assert!(!body.to_string().contains("password"));
    }

    #[test]
    fn test_upstream_body_carries_details() {
        let err = ProxyError::Upstream {
            status: StatusCode::FORBIDDEN,
            message: "Purge request failed".into(),
            details: Some(json!({ "success": false })),
        };
        let body = err.body();
        assert_eq!(body["error"], "Purge request failed");
        assert_eq!(body["status"], 403);
        assert_eq!(body["details"]["success"], false);
    }

    #[test]
    fn test_client_error_body() {
        let body = ProxyError::bad_request("Missing url").body();
        assert_eq!(body, json!({ "error": "Missing url" }));
    }
}
