//! Unified error response formatting for gateway handlers
//!
//! Keeps error bodies consistent across handlers: a JSON `{code, message,
//! id?, request_id?}` object with the status code chosen by the error
//! taxonomy. Backend error details are logged, never forwarded.

use crate::gateway::headers::X_REQUEST_ID;
use crate::gateway::types::GatewayError;
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standard error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code for programmatic handling
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Identifier of the missing resource, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Request ID for correlation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            id: None,
            request_id: None,
        }
    }

    /// Attach the identifier of the resource that was not found.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Convert to an HTTP response, echoing the request ID header.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let request_id = self.request_id.clone();
        let mut response = (status, Json(self)).into_response();

        if let Some(id) = request_id {
            if let Ok(value) = HeaderValue::from_str(&id) {
                response.headers_mut().insert(X_REQUEST_ID, value);
            }
        }

        response
    }
}

/// Extension trait mapping gateway errors onto responses
pub trait ErrorResponseExt {
    fn to_error_response(&self) -> ErrorResponse;
    fn status_code(&self) -> StatusCode;
}

impl ErrorResponseExt for GatewayError {
    fn to_error_response(&self) -> ErrorResponse {
        use GatewayError::*;

        match self {
            NoSuchRecording { id } => {
                ErrorResponse::new("NO_SUCH_RECORDING", "No Such Recording").with_id(id.clone())
            }
            RecordingNotFound { id } => {
                ErrorResponse::new("RECORDING_NOT_FOUND", "Recording not found").with_id(id.clone())
            }
            CollectionNotFound { id } => ErrorResponse::new(
                "COLLECTION_NOT_FOUND",
                "Collection not found",
            )
            .with_id(id.clone()),
            DownloadFailed => ErrorResponse::new("DOWNLOAD_FAILED", "Unable to download WARC"),
            Upstream(msg) => {
                ErrorResponse::new("UPSTREAM_ERROR", format!("Upstream request failed: {msg}"))
            }
            Contract(msg) => {
                ErrorResponse::new("CONTRACT_VIOLATION", format!("Contract violation: {msg}"))
            }
            Http(e) => ErrorResponse::new("HTTP_ERROR", format!("HTTP error: {e}")),
            Internal(msg) => ErrorResponse::new("INTERNAL_ERROR", msg.clone()),
        }
    }

    fn status_code(&self) -> StatusCode {
        use GatewayError::*;

        match self {
            NoSuchRecording { .. } | RecordingNotFound { .. } | CollectionNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            DownloadFailed => StatusCode::BAD_REQUEST,
            Upstream(_) => StatusCode::BAD_GATEWAY,
            Contract(_) | Http(_) | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
