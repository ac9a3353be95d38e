mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn post_query(server: &common::TestServer, query: &str) -> Result<Value> {
    let res = reqwest::Client::new()
        .post(server.url("/graphql"))
        .json(&json!({ "query": query }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(res.json().await?)
}

#[tokio::test]
async fn business_error_is_normalized() -> Result<()> {
    let server = common::TestServer::start().await?;

    let body = post_query(&server, "{ missingPost }").await?;

    assert_eq!(
        body["errors"],
        json!([{"message": "Post not found", "status": 404, "data": {"field": "missing"}}])
    );
    Ok(())
}

#[tokio::test]
async fn business_error_without_details_uses_defaults() -> Result<()> {
    let server = common::TestServer::start().await?;

    let body = post_query(&server, "{ unlabeledFailure }").await?;

    assert_eq!(body["errors"], json!([{"message": "An error occurred", "status": 500}]));
    Ok(())
}

#[tokio::test]
async fn unexpected_resolver_error_gets_status_500() -> Result<()> {
    let server = common::TestServer::start().await?;

    let body = post_query(&server, "{ dbDown }").await?;

    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["errors"], json!([{"message": "connection refused", "status": 500}]));
    Ok(())
}

#[tokio::test]
async fn validation_errors_pass_through_unchanged() -> Result<()> {
    let server = common::TestServer::start().await?;

    let body = post_query(&server, "{ noSuchField }").await?;

    let error = &body["errors"][0];
    assert!(error["message"].as_str().unwrap_or_default().contains("noSuchField"));
    assert!(error.get("locations").is_some());
    assert!(error.get("status").is_none(), "transport errors keep the executor's shape");
    Ok(())
}

#[tokio::test]
async fn partial_results_keep_data_alongside_errors() -> Result<()> {
    let server = common::TestServer::start().await?;

    // Both root fields are non-null, so one failure nulls the whole data
    let body = post_query(&server, "{ status missingPost }").await?;
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["errors"][0]["status"], 404);
    Ok(())
}

#[tokio::test]
async fn get_executes_query_string() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = reqwest::Client::new()
        .get(server.url("/graphql"))
        .query(&[("query", "{ status }")])
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({"data": {"status": "ok"}}));
    Ok(())
}

#[tokio::test]
async fn get_without_query_serves_graphiql() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = reqwest::Client::new().get(server.url("/graphql")).send().await?;

    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str()?.to_string();
    assert!(content_type.starts_with("text/html"));
    assert!(res.text().await?.to_lowercase().contains("graphiql"));
    Ok(())
}

#[tokio::test]
async fn get_without_query_is_rejected_when_explorer_disabled() -> Result<()> {
    let server = common::TestServer::start_with(|config| config.graphql.enable_graphiql = false).await?;

    let res = reqwest::Client::new().get(server.url("/graphql")).send().await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?,
        json!({"message": "Must provide query string.", "status": 400})
    );
    Ok(())
}

#[tokio::test]
async fn malformed_body_gets_fallback_envelope() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = reqwest::Client::new()
        .post(server.url("/graphql"))
        .header("content-type", "application/json")
        .body("{ this is not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], 400);
    assert!(body["message"].is_string());
    Ok(())
}
