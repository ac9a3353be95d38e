// HTTP API Error Types
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::storage::StorageError;

/// Message used whenever the originating error has nothing client-safe to say
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// The single error shape returned to clients, whatever the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorEnvelope {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
            data: None,
        }
    }

    pub fn internal() -> Self {
        Self::new(500, DEFAULT_ERROR_MESSAGE)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

/// Failure raised by business logic (resolvers, handlers) with an optional
/// status code and structured payload.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct BusinessError {
    pub status: Option<u16>,
    pub message: String,
    pub data: Option<Value>,
}

impl BusinessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message).with_status(400)
    }

    pub fn not_authenticated() -> Self {
        Self::new("Not Authenticated").with_status(401)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message).with_status(403)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).with_status(404)
    }

    /// 422 with per-field messages under `data`
    pub fn validation(message: impl Into<String>, field_errors: BTreeMap<String, String>) -> Self {
        Self::new(message).with_status(422).with_data(json!(field_errors))
    }

    /// Wrap for a resolver return. The business error stays attached as the
    /// source so the GraphQL normalizer can find it again.
    pub fn into_graphql(self) -> async_graphql::Error {
        async_graphql::Error::new_with_source(self)
    }

    /// Normalize into the client envelope; a missing or unusable status falls
    /// back to 500 and an empty message to the generic one.
    pub fn envelope(&self) -> ErrorEnvelope {
        let message = if self.message.trim().is_empty() {
            DEFAULT_ERROR_MESSAGE.to_string()
        } else {
            self.message.clone()
        };

        let status = self
            .status
            .filter(|status| StatusCode::from_u16(*status).is_ok())
            .unwrap_or(500);

        ErrorEnvelope {
            message,
            status,
            data: self.data.clone(),
        }
    }
}

/// Errors raised outside GraphQL execution. `IntoResponse` is the fallback
/// normalizer: log the raw error, answer with exactly one envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Business(#[from] BusinessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{message}")]
    Transport { status: StatusCode, message: String },
}

impl ApiError {
    pub fn transport(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::transport(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::transport(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        self.envelope().status
    }

    /// Client-visible envelope for this error
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ApiError::Business(err) => err.envelope(),
            // Don't expose filesystem details to clients
            ApiError::Storage(_) => ErrorEnvelope::internal(),
            ApiError::Multipart(err) => ErrorEnvelope::new(err.status().as_u16(), err.body_text()),
            ApiError::Transport { status, message } => {
                if status.is_server_error() {
                    ErrorEnvelope::new(status.as_u16(), DEFAULT_ERROR_MESSAGE)
                } else {
                    ErrorEnvelope::new(status.as_u16(), message.clone())
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();

        if envelope.status >= 500 {
            tracing::error!(status = envelope.status, error = ?self, "request failed");
        } else {
            tracing::warn!(status = envelope.status, error = %self, "request rejected");
        }

        envelope.into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
