//! Error normalization for GraphQL responses.
//!
//! Execution errors are classified explicitly: errors whose source is a
//! [`BusinessError`] become an [`ErrorEnvelope`], any other resolver failure
//! carrying a source becomes a 500 envelope, and errors raised by the
//! executor itself (syntax, validation, missing context data) are passed
//! through as it produced them.

use async_graphql::{Response, ServerError};
use serde_json::{json, Value};

use crate::error::{BusinessError, ErrorEnvelope, DEFAULT_ERROR_MESSAGE};

#[derive(Debug, Clone, Copy)]
pub enum GraphqlFailure<'a> {
    Transport(&'a ServerError),
    Business(&'a BusinessError),
    /// Resolver failure that is not a `BusinessError` (db, io, ...)
    Unclassified(&'a ServerError),
}

impl<'a> GraphqlFailure<'a> {
    pub fn classify(error: &'a ServerError) -> Self {
        match error.source::<BusinessError>() {
            Some(business) => GraphqlFailure::Business(business),
            None if error.source.is_some() => GraphqlFailure::Unclassified(error),
            None => GraphqlFailure::Transport(error),
        }
    }
}

/// Format one execution error for the client.
pub fn format_error(error: &ServerError) -> Value {
    match GraphqlFailure::classify(error) {
        GraphqlFailure::Transport(error) => {
            serde_json::to_value(error).unwrap_or_else(|_| json!({ "message": error.message }))
        }
        GraphqlFailure::Business(business) => json!(business.envelope()),
        GraphqlFailure::Unclassified(error) => {
            let message = if error.message.trim().is_empty() {
                DEFAULT_ERROR_MESSAGE
            } else {
                error.message.as_str()
            };
            json!(ErrorEnvelope::new(500, message))
        }
    }
}

/// Serialize an executor response with every error normalized.
pub fn format_response(response: &Response) -> Value {
    let mut body = match serde_json::to_value(response) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Failed to serialize GraphQL response: {}", e);
            json!({ "data": null })
        }
    };

    if !response.errors.is_empty() {
        body["errors"] = Value::Array(response.errors.iter().map(format_error).collect());
    }

    body
}
