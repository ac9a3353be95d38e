use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::app::AppState;
use crate::database;

/// GET /health - liveness plus a database probe when a pool is configured
pub async fn health<E: Clone + Send + Sync + 'static>(State(state): State<AppState<E>>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(pool) = &state.database else {
        return (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "not configured"
            })),
        );
    };

    match database::health_check(pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "message": "database unavailable",
                    "status": 503,
                    "data": {
                        "timestamp": now,
                        "database": "error"
                    }
                })),
            )
        }
    }
}
