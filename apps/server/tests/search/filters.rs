use crate::support::*;
use axum::http::{Method, StatusCode};
use question_bank::models::Category;
use serde_json::json;

#[tokio::test]
async fn solved_filter_returns_only_the_users_solved_matches() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let mut database = Vec::new();
    for i in 0..10 {
        database.push(
            app.seed(&format!("How does an index work? #{i}"), Category::Database, &[])
                .await?,
        );
    }
    app.seed("Transactions and isolation", Category::Database, &[]).await?;
    let other_category = app
        .seed("Search index sharding", Category::SystemDesign, &[])
        .await?;

    let user = 7;
    for q in [&database[1], &database[4], &database[8]] {
        app.solve(user, q.id).await?;
    }
    app.solve(user, other_category.id).await?;
    app.solve(99, database[2].id).await?;

    let token = token_for(user, &[]);
    let page = app
        .search(
            json!({
                "category": "DATABASE",
                "keyword": "index",
                "isSolved": true,
                "sortField": "createdAt",
                "sortDirection": "desc"
            }),
            Some(&token),
        )
        .await?;

    assert_eq!(
        content_ids(&page),
        vec![database[8].id.0, database[4].id.0, database[1].id.0]
    );
    assert_eq!(page["totalElements"], json!(3));
    assert!(page["content"]
        .as_array()
        .is_some_and(|items| items.iter().all(|item| item["isSolved"] == json!(true))));
    Ok(())
}

#[tokio::test]
async fn unsolved_filter_excludes_answered_questions() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let a = app.seed("Heap sort", Category::Algorithm, &[]).await?;
    let b = app.seed("Quick sort", Category::Algorithm, &[]).await?;
    let c = app.seed("Merge sort", Category::Algorithm, &[]).await?;
    app.solve(3, b.id).await?;

    let token = token_for(3, &[]);
    let page = app.search(json!({"isSolved": false}), Some(&token)).await?;
    assert_eq!(content_ids(&page), vec![a.id.0, c.id.0]);
    Ok(())
}

#[tokio::test]
async fn solved_filter_requires_a_user() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    app.seed("Heap sort", Category::Algorithm, &[]).await?;

    let error = app
        .json(
            Method::POST,
            "/api/v1/questions/search",
            Some(json!({"isSolved": true})),
            None,
            StatusCode::UNAUTHORIZED,
        )
        .await?;
    assert_eq!(error["error"]["status"], json!(401));
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_rejected_even_for_anonymous_routes() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let (status, headers, _) = app
        .request(Method::GET, "/api/v1/questions", None, Some("not-a-jwt"))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        headers.get("www-authenticate").and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );
    Ok(())
}

#[tokio::test]
async fn keyword_matches_case_insensitively_and_literally() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let upper = app.seed("What is an INDEX?", Category::Database, &[]).await?;
    app.seed("Joins explained", Category::Database, &[]).await?;
    let percent = app.seed("Why is 100% CPU bad?", Category::Infrastructure, &[]).await?;
    app.seed("Why is 100 CPU bad?", Category::Infrastructure, &[]).await?;

    let page = app.search(json!({"keyword": "  index "}), None).await?;
    assert_eq!(content_ids(&page), vec![upper.id.0]);

    let page = app.search(json!({"keyword": "100%"}), None).await?;
    assert_eq!(content_ids(&page), vec![percent.id.0]);

    let page = app.search(json!({"keyword": "   "}), None).await?;
    assert_eq!(page["totalElements"], json!(4));
    Ok(())
}

#[tokio::test]
async fn category_filter_is_case_insensitive_and_validated() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let net = app.seed("TCP handshake", Category::Network, &[]).await?;
    app.seed("B-tree", Category::Database, &[]).await?;

    let page = app
        .json(
            Method::GET,
            "/api/v1/questions?category=network",
            None,
            None,
            StatusCode::OK,
        )
        .await?;
    assert_eq!(content_ids(&page), vec![net.id.0]);

    app.json(
        Method::GET,
        "/api/v1/questions?category=COOKING",
        None,
        None,
        StatusCode::BAD_REQUEST,
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn tags_match_any_of_the_requested_names() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let sql = app.seed("Joins", Category::Database, &["sql"]).await?;
    let both = app
        .seed("JPA and SQL", Category::Framework, &["sql", "java"])
        .await?;
    let java = app.seed("Generics", Category::Programming, &["java"]).await?;
    app.seed("Ownership", Category::Programming, &["rust"]).await?;
    app.seed("Untagged", Category::Programming, &[]).await?;

    let page = app
        .json(
            Method::GET,
            "/api/v1/questions?tags=sql,%20java,,java",
            None,
            None,
            StatusCode::OK,
        )
        .await?;
    assert_eq!(content_ids(&page), vec![sql.id.0, both.id.0, java.id.0]);
    assert_eq!(page["totalElements"], json!(3));

    let page = app.search(json!({"tags": ["  ", ""]}), None).await?;
    assert_eq!(page["totalElements"], json!(5));
    Ok(())
}
