use crate::support::*;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use question_bank::{
    api::create_router,
    config::StorageBackend,
    models::Category,
    state::AppState,
    Config,
};
use serde_json::json;
use std::path::Path;
use tower::ServiceExt as _;

#[tokio::test]
async fn health_and_request_id() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let (status, headers, body) = app.request(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("x-request-id"));
    let body: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(body["status"], json!("ok"));
    Ok(())
}

#[tokio::test]
async fn metrics_expose_search_counters() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    app.seed("Q", Category::Network, &["dns"]).await?;
    app.search(json!({"tags": ["dns"]}), None).await?;

    let (status, _, body) = app.request(Method::GET, "/metrics", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("qbank_question_search_total"));
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_a_json_404() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let error = app
        .json(Method::GET, "/api/v2/nothing", None, None, StatusCode::NOT_FOUND)
        .await?;
    assert_eq!(error["error"]["status"], json!(404));
    Ok(())
}

#[tokio::test]
async fn undecodable_requests_use_the_error_body() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let admin = token_for(1, &["ADMIN"]);

    let cases = [
        (
            Method::POST,
            "/api/v1/questions/search",
            Some(json!({"page": "abc"})),
            None,
        ),
        (
            Method::GET,
            "/api/v1/questions?isSolved=maybe",
            None,
            None,
        ),
        (
            Method::GET,
            "/api/v1/questions?size=ten",
            None,
            None,
        ),
        (
            Method::POST,
            "/api/v1/tags",
            Some(json!({"description": "no name"})),
            Some(admin.as_str()),
        ),
    ];

    for (method, path, body, token) in cases {
        let (status, headers, bytes) = app.request(method, path, body, token).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(
            headers.get("content-type").and_then(|v| v.to_str().ok()),
            Some("application/json"),
            "{path}"
        );
        let error: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(error["error"]["status"], json!(400), "{path}");
        assert!(error["error"]["message"].is_string(), "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn memory_backend_serves_the_seed_fixture() -> anyhow::Result<()> {
    let mut config = Config::default();
    config.database.backend = StorageBackend::Memory;
    config.database.seed_file =
        Some(Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/questions.json"));
    config.recommend.enabled = false;
    config.validate().map_err(anyhow::Error::msg)?;

    let router = create_router(AppState::new(config).await?);
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/questions?tags=index")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let page: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(page["totalElements"], json!(2));
    assert_eq!(page["content"][0]["tags"], json!(["index", "sql"]));
    Ok(())
}
