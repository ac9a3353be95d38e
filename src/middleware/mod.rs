pub mod auth;
pub mod cors;

pub use auth::{auth_gate, AuthState, Identity, RequestContext};
pub use cors::cors_filter;
