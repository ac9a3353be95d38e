use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::config::{AppConfig, SecurityConfig};
use crate::error::{ApiError, BusinessError};

/// Identity resolved from a valid bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

/// Per-request authentication outcome, inserted by [`auth_gate`] before any
/// handler runs and forwarded into GraphQL resolvers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub auth: AuthState,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            auth: AuthState::Authenticated(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.auth {
            AuthState::Authenticated(identity) => Some(identity),
            AuthState::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity().map(|identity| identity.user_id.as_str())
    }

    /// Capability check for handlers and resolvers that need a caller.
    pub fn require_authenticated(&self) -> Result<&Identity, BusinessError> {
        self.identity().ok_or_else(BusinessError::not_authenticated)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestContext>().cloned().ok_or_else(|| {
            ApiError::transport(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Request context missing; auth gate not installed",
            )
        })
    }
}

/// Non-rejecting auth gate: resolves the caller from the `Authorization`
/// header and always passes the request on.
pub async fn auth_gate(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = resolve_context(request.headers(), &config.security);
    request.extensions_mut().insert(context);

    next.run(request).await
}

/// Missing, malformed, expired or forged credentials all resolve to anonymous.
pub fn resolve_context(headers: &HeaderMap, security: &SecurityConfig) -> RequestContext {
    let token = match extract_bearer_token(headers) {
        Ok(Some(token)) => token,
        Ok(None) => return RequestContext::anonymous(),
        Err(reason) => {
            tracing::debug!(reason, "ignoring malformed Authorization header");
            return RequestContext::anonymous();
        }
    };

    match validate_jwt(token, security) {
        Ok(claims) => {
            tracing::debug!(user_id = %claims.user_id, "request authenticated");
            RequestContext::authenticated(Identity::from(claims))
        }
        Err(e) => {
            tracing::debug!(error = %e, "bearer token rejected, continuing unauthenticated");
            RequestContext::anonymous()
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or("Authorization header must use Bearer token format")?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("Empty JWT token");
    }

    Ok(Some(token))
}
