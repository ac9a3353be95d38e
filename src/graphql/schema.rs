use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema, SimpleObject};

use crate::middleware::RequestContext;

/// Schema served by the binary when no business schema is plugged in
pub type AppSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

#[derive(Debug, Clone, SimpleObject)]
pub struct Viewer {
    pub user_id: String,
    pub email: Option<String>,
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Public liveness probe
    async fn status(&self) -> String {
        "ok".to_string()
    }

    /// The authenticated caller
    async fn viewer(&self, ctx: &Context<'_>) -> async_graphql::Result<Viewer> {
        let request = ctx.data::<RequestContext>()?;
        let identity = request
            .require_authenticated()
            .map_err(|e| e.into_graphql())?;

        Ok(Viewer {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
        })
    }
}

pub fn build_schema() -> AppSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription).finish()
}
