use crate::support::*;
use axum::http::{Method, StatusCode};
use question_bank::models::Category;
use serde_json::json;

#[tokio::test]
async fn page_is_enriched_with_a_fixed_number_of_queries() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    for i in 0..30 {
        let q = app
            .seed(&format!("Q{i}"), Category::Framework, &["spring", "jpa"])
            .await?;
        if i % 2 == 0 {
            app.solve(5, q.id).await?;
        }
    }
    app.store.reset_query_counts();

    let token = token_for(5, &[]);
    let page = app
        .search(json!({"tags": ["spring"], "size": 20}), Some(&token))
        .await?;
    assert_eq!(content_ids(&page).len(), 20);

    let counts = app.store.query_counts();
    assert_eq!(counts.find_ids, 1);
    assert_eq!(counts.load_questions, 1);
    assert_eq!(counts.find_questions, 0);
    assert_eq!(counts.count_questions, 1);
    assert_eq!(counts.tag_names, 1);
    assert_eq!(counts.answered_ids, 1);

    let first = &page["content"][0];
    assert_eq!(first["tags"], json!(["jpa", "spring"]));
    assert_eq!(first["isSolved"], json!(true));
    assert_eq!(page["content"][1]["isSolved"], json!(false));
    Ok(())
}

#[tokio::test]
async fn anonymous_search_skips_the_solved_lookup() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let q = app.seed("Docker layers", Category::Devops, &[]).await?;
    app.solve(1, q.id).await?;
    app.store.reset_query_counts();

    let page = app.search(json!({}), None).await?;
    assert_eq!(page["content"][0]["isSolved"], json!(false));
    assert_eq!(page["content"][0]["tags"], json!([]));

    let counts = app.store.query_counts();
    assert_eq!(counts.find_questions, 1);
    assert_eq!(counts.answered_ids, 0);
    Ok(())
}

#[tokio::test]
async fn empty_page_issues_no_enrichment_queries() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    app.store.reset_query_counts();

    let token = token_for(1, &[]);
    let page = app.search(json!({"tags": ["none"]}), Some(&token)).await?;
    assert!(content_ids(&page).is_empty());

    let counts = app.store.query_counts();
    assert_eq!(counts.load_questions, 0);
    assert_eq!(counts.tag_names, 0);
    assert_eq!(counts.answered_ids, 0);
    Ok(())
}

#[tokio::test]
async fn detail_includes_tags_solved_state_and_update_time() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let q = app
        .seed("Explain CSRF", Category::Security, &["web", "owasp"])
        .await?;
    app.solve(11, q.id).await?;

    let token = token_for(11, &[]);
    let detail = app
        .json(
            Method::GET,
            &format!("/api/v1/questions/{}", q.id),
            None,
            Some(&token),
            StatusCode::OK,
        )
        .await?;
    assert_eq!(detail["id"], json!(q.id.0));
    assert_eq!(detail["category"], json!("SECURITY"));
    assert_eq!(detail["tags"], json!(["owasp", "web"]));
    assert_eq!(detail["isSolved"], json!(true));
    assert!(detail["updatedAt"].is_string());

    let error = app
        .json(
            Method::GET,
            "/api/v1/questions/424242",
            None,
            None,
            StatusCode::NOT_FOUND,
        )
        .await?;
    assert_eq!(error["error"]["status"], json!(404));
    Ok(())
}
