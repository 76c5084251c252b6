use crate::support::*;
use axum::http::{Method, StatusCode};
use question_bank::models::Category;
use serde_json::json;

#[tokio::test]
async fn lists_tag_names_alphabetically() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    app.seed("Q", Category::Programming, &["rust", "java", "go"]).await?;

    let names = app
        .json(Method::GET, "/api/v1/tags", None, None, StatusCode::OK)
        .await?;
    assert_eq!(names, json!(["go", "java", "rust"]));
    Ok(())
}

#[tokio::test]
async fn creating_tags_requires_the_admin_role() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let body = json!({"name": "kotlin"});

    app.json(
        Method::POST,
        "/api/v1/tags",
        Some(body.clone()),
        None,
        StatusCode::UNAUTHORIZED,
    )
    .await?;

    let member = token_for(2, &["USER"]);
    app.json(
        Method::POST,
        "/api/v1/tags",
        Some(body),
        Some(&member),
        StatusCode::FORBIDDEN,
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn creating_an_existing_tag_returns_it() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let admin = token_for(1, &["admin"]);

    let created = app
        .json(
            Method::POST,
            "/api/v1/tags",
            Some(json!({"name": " kotlin ", "description": "JVM language"})),
            Some(&admin),
            StatusCode::OK,
        )
        .await?;
    assert_eq!(created["name"], json!("kotlin"));

    let again = app
        .json(
            Method::POST,
            "/api/v1/tags",
            Some(json!({"name": "kotlin"})),
            Some(&admin),
            StatusCode::OK,
        )
        .await?;
    assert_eq!(again["id"], created["id"]);
    assert_eq!(again["description"], json!("JVM language"));

    app.json(
        Method::POST,
        "/api/v1/tags",
        Some(json!({"name": ""})),
        Some(&admin),
        StatusCode::BAD_REQUEST,
    )
    .await?;
    Ok(())
}
