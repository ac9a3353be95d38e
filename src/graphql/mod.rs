//! GraphQL dispatcher: the single `/graphql` endpoint.
//!
//! Business semantics live in whatever [`Executor`] the router is built
//! with. This module only forwards the request context into execution and
//! normalizes the errors that come back.

pub mod format;
pub mod schema;

use async_graphql::{http::GraphiQLSource, Executor};
use axum::{
    extract::{rejection::JsonRejection, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestContext;

pub use format::{format_error, format_response, GraphqlFailure};
pub use schema::{build_schema, AppSchema};

pub const GRAPHQL_PATH: &str = "/graphql";

/// GET /graphql - execute from the query string, or serve GraphiQL when no
/// `query` parameter is present.
pub async fn graphql_get<E: Executor>(
    State(state): State<AppState<E>>,
    context: RequestContext,
    RawQuery(raw): RawQuery,
) -> ApiResult<Response> {
    let raw = raw.unwrap_or_default();

    if !has_query_param(&raw) {
        if state.config.graphql.enable_graphiql {
            let source = GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish();
            return Ok(Html(source).into_response());
        }
        return Err(ApiError::transport(StatusCode::BAD_REQUEST, "Must provide query string."));
    }

    let request = async_graphql::http::parse_query_string(&raw)
        .map_err(|e| ApiError::transport(StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(execute(&state, context, request).await).into_response())
}

/// POST /graphql - JSON body `{ query, variables?, operationName? }`
pub async fn graphql_post<E: Executor>(
    State(state): State<AppState<E>>,
    context: RequestContext,
    body: Result<Json<async_graphql::Request>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body.map_err(|rejection| ApiError::transport(rejection.status(), rejection.body_text()))?;

    Ok(Json(execute(&state, context, request).await))
}

async fn execute<E: Executor>(
    state: &AppState<E>,
    context: RequestContext,
    request: async_graphql::Request,
) -> Value {
    let operation = request.operation_name.clone();
    let mut request = request.data(context);
    if let Some(pool) = &state.database {
        request = request.data(pool.clone());
    }

    let response = state.executor.execute(request).await;

    for error in &response.errors {
        match GraphqlFailure::classify(error) {
            GraphqlFailure::Business(business) => {
                tracing::debug!(?operation, status = ?business.status, error = %business, "resolver failed");
            }
            GraphqlFailure::Unclassified(error) => {
                tracing::error!(?operation, error = %error.message, "resolver failed unexpectedly");
            }
            GraphqlFailure::Transport(error) => {
                tracing::debug!(?operation, error = %error.message, "graphql request error");
            }
        }
    }

    format_response(&response)
}

fn has_query_param(raw: &str) -> bool {
    raw.split('&')
        .filter_map(|pair| pair.split('=').next())
        .any(|key| key == "query")
}
