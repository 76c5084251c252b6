use crate::support::*;
use axum::http::{Method, StatusCode};
use question_bank::{
    models::Category,
    services::{DisabledRecommender, RecommendedQuestion, Recommender},
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn search_includes_recommendations_for_the_filters() -> anyhow::Result<()> {
    let stub = Arc::new(StubRecommender::returning(vec![RecommendedQuestion {
        id: 900,
        content: "What is MVCC?".to_string(),
        category: "DATABASE".to_string(),
    }]));
    let recommender: Arc<dyn Recommender> = stub.clone();
    let app = TestApp::with_options(TestAppOptions {
        recommender: Some(recommender),
        ..Default::default()
    })?;
    app.seed("Isolation levels", Category::Database, &["sql"]).await?;

    let body = app
        .search(json!({"category": "database", "tags": ["sql"]}), None)
        .await?;
    assert_eq!(body["recommendations"][0]["id"], json!(900));
    assert_eq!(content_ids(&body).len(), 1);

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].category.as_deref(), Some("DATABASE"));
    assert_eq!(requests[0].tags, vec!["sql".to_string()]);
    Ok(())
}

#[tokio::test]
async fn missing_recommendations_do_not_fail_the_search() -> anyhow::Result<()> {
    let recommender: Arc<dyn Recommender> = Arc::new(DisabledRecommender);
    let app = TestApp::with_options(TestAppOptions {
        recommender: Some(recommender),
        ..Default::default()
    })?;
    app.seed("Isolation levels", Category::Database, &[]).await?;

    let body = app.search(json!({}), None).await?;
    assert_eq!(body["recommendations"], json!([]));
    assert_eq!(body["totalElements"], json!(1));
    Ok(())
}

#[tokio::test]
async fn rejected_search_makes_no_recommendation_call() -> anyhow::Result<()> {
    let stub = Arc::new(StubRecommender::default());
    let recommender: Arc<dyn Recommender> = stub.clone();
    let app = TestApp::with_options(TestAppOptions {
        recommender: Some(recommender),
        ..Default::default()
    })?;

    app.json(
        Method::POST,
        "/api/v1/questions/search",
        Some(json!({"isSolved": true})),
        None,
        StatusCode::UNAUTHORIZED,
    )
    .await?;
    app.json(
        Method::POST,
        "/api/v1/questions/search",
        Some(json!({"size": 0})),
        None,
        StatusCode::BAD_REQUEST,
    )
    .await?;
    assert!(stub.requests().is_empty());
    Ok(())
}
