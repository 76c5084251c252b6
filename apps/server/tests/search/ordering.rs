use crate::support::*;
use chrono::{TimeZone, Utc};
use question_bank::models::Category;
use serde_json::json;

#[tokio::test]
async fn tagged_search_keeps_requested_order_with_id_tie_break() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let at = |secs: i64| Utc.timestamp_opt(1_710_000_000 + secs, 0).unwrap();

    let older = app
        .store
        .insert_question_at("Older", Category::Programming, at(0))
        .await;
    let tied_a = app
        .store
        .insert_question_at("Tied A", Category::Programming, at(60))
        .await;
    let tied_b = app
        .store
        .insert_question_at("Tied B", Category::Programming, at(60))
        .await;
    let newest = app
        .store
        .insert_question_at("Newest", Category::Programming, at(120))
        .await;
    for q in [&older, &tied_a, &tied_b, &newest] {
        app.store.tag_question(q.id, "java").await?;
    }

    let expected = vec![newest.id.0, tied_a.id.0, tied_b.id.0, older.id.0];

    let tagged = app
        .search(
            json!({"tags": ["java"], "sortField": "createdAt", "sortDirection": "DESC"}),
            None,
        )
        .await?;
    assert_eq!(content_ids(&tagged), expected);

    let untagged = app
        .search(json!({"sortField": "createdAt", "sortDirection": "desc"}), None)
        .await?;
    assert_eq!(content_ids(&untagged), expected);
    Ok(())
}

#[tokio::test]
async fn pages_do_not_overlap_under_ties() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let same = Utc.timestamp_opt(1_710_000_000, 0).unwrap();
    let mut all = Vec::new();
    for i in 0..7 {
        let q = app
            .store
            .insert_question_at(&format!("Q{i}"), Category::Security, same)
            .await;
        app.store.tag_question(q.id, "owasp").await?;
        all.push(q);
    }

    let mut seen = Vec::new();
    for page in 0..3 {
        let body = app
            .search(
                json!({"tags": ["owasp"], "page": page, "size": 3, "sort": "createdAt"}),
                None,
            )
            .await?;
        seen.extend(content_ids(&body));
    }
    assert_eq!(seen, ids_of(&all));
    Ok(())
}

#[tokio::test]
async fn unknown_sort_falls_back_to_id_ascending() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let a = app.seed("b", Category::Devops, &[]).await?;
    let b = app.seed("a", Category::Devops, &[]).await?;

    let page = app
        .search(json!({"sortField": "popularity", "sortDirection": "desc"}), None)
        .await?;
    assert_eq!(content_ids(&page), vec![a.id.0, b.id.0]);

    let page = app
        .search(json!({"sortField": "content", "sortDirection": "sideways"}), None)
        .await?;
    assert_eq!(content_ids(&page), vec![b.id.0, a.id.0]);
    Ok(())
}
