// handlers/mod.rs - REST-side handlers
//
// Everything business-related goes through /graphql; the handlers here are
// the out-of-band image upload plus service endpoints and fallbacks.

pub mod health;
pub mod post_image;

pub use health::health;
pub use post_image::post_image;

use axum::response::Json;
use serde_json::{json, Value};

use crate::error::ApiError;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Content API",
        "version": version,
        "endpoints": {
            "graphql": "/graphql (GET: explorer or query string, POST: JSON)",
            "post_image": "/post-image (PUT multipart, authenticated)",
            "images": "/images/* (public)",
            "health": "/health (public)"
        }
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
