#![allow(dead_code)]

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema};
use content_api::{
    auth::{generate_jwt, Claims},
    middleware::RequestContext,
    router, AppConfig, AppState, BusinessError,
};
use serde_json::json;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Route server logs through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Stand-in business schema exercising each error path of the dispatcher.
pub struct TestQuery;

#[Object]
impl TestQuery {
    async fn status(&self) -> String {
        "ok".to_string()
    }

    async fn is_authenticated(&self, ctx: &Context<'_>) -> async_graphql::Result<bool> {
        Ok(ctx.data::<RequestContext>()?.is_authenticated())
    }

    async fn viewer_id(&self, ctx: &Context<'_>) -> async_graphql::Result<String> {
        let identity = ctx
            .data::<RequestContext>()?
            .require_authenticated()
            .map_err(|e| e.into_graphql())?;
        Ok(identity.user_id.clone())
    }

    async fn missing_post(&self) -> async_graphql::Result<String> {
        Err(BusinessError::not_found("Post not found")
            .with_data(json!({"field": "missing"}))
            .into_graphql())
    }

    async fn unlabeled_failure(&self) -> async_graphql::Result<String> {
        Err(BusinessError::new("").into_graphql())
    }

    async fn db_down(&self) -> async_graphql::Result<String> {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
        Err(err.into())
    }

    async fn explode(&self) -> async_graphql::Result<String> {
        panic!("resolver blew up")
    }
}

pub type TestSchema = Schema<TestQuery, EmptyMutation, EmptySubscription>;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config: Arc<AppConfig>,
    upload_dir: TempDir,
}

impl TestServer {
    /// Start the full pipeline in-process on a free port, uploads in a temp dir.
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        init_tracing();

        let upload_dir = tempfile::tempdir().context("failed to create upload dir")?;
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;

        let mut config = AppConfig::development();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;
        config.storage.upload_dir = upload_dir.path().to_path_buf();
        configure(&mut config);
        let config = Arc::new(config);

        let schema = Schema::build(TestQuery, EmptyMutation, EmptySubscription).finish();
        let state = AppState::new(config.clone(), schema, None);

        let listener = tokio::net::TcpListener::bind(config.bind_addr())
            .await
            .context("failed to bind test listener")?;

        tracing::debug!(port, "test server listening");

        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            config,
            upload_dir,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token(&self, user_id: &str) -> String {
        let claims = Claims::new(user_id, None, &self.config.security);
        generate_jwt(&claims, &self.config.security).expect("sign test token")
    }

    pub fn upload_path(&self, name: &str) -> PathBuf {
        self.upload_dir.path().join(name)
    }

    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir.path())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

pub fn png_form(bytes: impl Into<Cow<'static, [u8]>>, name: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(name.to_string())
        .mime_str("image/png")
        .expect("valid mime");
    reqwest::multipart::Form::new().part("image", part)
}
