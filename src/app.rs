use std::any::Any;
use std::sync::Arc;

use anyhow::Context as _;
use async_graphql::Executor;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::ErrorEnvelope;
use crate::graphql::{self, GRAPHQL_PATH};
use crate::handlers;
use crate::middleware::{auth_gate, cors::apply_cors_headers, cors_filter};
use crate::storage::UploadSink;

/// Shared, read-only router state. `E` is the GraphQL executor that owns the
/// business schema.
#[derive(Clone)]
pub struct AppState<E> {
    pub config: Arc<AppConfig>,
    pub uploads: Arc<UploadSink>,
    pub database: Option<PgPool>,
    pub executor: E,
}

impl<E: Executor> AppState<E> {
    pub fn new(config: Arc<AppConfig>, executor: E, database: Option<PgPool>) -> Self {
        let uploads = Arc::new(UploadSink::new(&config.storage));
        Self {
            config,
            uploads,
            database,
            executor,
        }
    }
}

impl<E: Clone> FromRef<AppState<E>> for Arc<UploadSink> {
    fn from_ref(state: &AppState<E>) -> Self {
        state.uploads.clone()
    }
}

impl<E: Clone> FromRef<AppState<E>> for Arc<AppConfig> {
    fn from_ref(state: &AppState<E>) -> Self {
        state.config.clone()
    }
}

/// Build the full request pipeline.
///
/// Per request the order is fixed: CORS filter, body limit, auth gate, then
/// route dispatch. `Router::layer` wraps outward, so layers are listed
/// innermost first.
pub fn router<E: Executor>(state: AppState<E>) -> Router {
    let config = state.config.clone();

    let mut routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health::<E>))
        .route(
            "/post-image",
            put(handlers::post_image).fallback(handlers::method_not_allowed),
        )
        .route(
            GRAPHQL_PATH,
            get(graphql::graphql_get::<E>)
                .post(graphql::graphql_post::<E>)
                .fallback(handlers::method_not_allowed),
        );

    let prefix = state.uploads.public_prefix();
    if !prefix.is_empty() {
        routes = routes.nest_service(&format!("/{prefix}"), ServeDir::new(state.uploads.root()));
    }

    routes
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(config.clone(), auth_gate))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(middleware::from_fn(cors_filter))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

/// Last line of defence: a panicking handler still yields one envelope.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");

    // The CORS filter was unwound with the handler
    let mut response = ErrorEnvelope::internal().into_response();
    apply_cors_headers(response.headers_mut());
    response
}

/// Connect the database collaborator, then bind and serve until shutdown.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);

    let database = crate::database::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    let state = AppState::new(config.clone(), graphql::build_schema(), database);
    state
        .uploads
        .ensure_root()
        .await
        .with_context(|| format!("failed to create upload dir {}", state.uploads.root().display()))?;

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Content API listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Content API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
