//! Question search and detail handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    api::extractors::{ApiJson, ApiQuery},
    auth::AuthenticatedPrincipal,
    models::{Category, QuestionId, SearchSpec, UserId},
    search::TotalCount,
    services::{QuestionPage, QuestionSummary, RecommendRequest, RecommendedQuestion},
    state::AppState,
    Result,
};

/// Query string for `GET /api/v1/questions`. `tags` is comma separated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    #[serde(alias = "sortField")]
    pub sort: Option<String>,
    #[serde(alias = "sortDirection")]
    pub direction: Option<String>,
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub tags: Option<String>,
    pub is_solved: Option<bool>,
}

impl From<QuestionListParams> for SearchSpec {
    fn from(params: QuestionListParams) -> Self {
        SearchSpec {
            category: params.category,
            keyword: params.keyword,
            tags: params
                .tags
                .map(|raw| raw.split(',').map(str::to_string).collect()),
            is_solved: params.is_solved,
            page: params.page,
            size: params.size,
            sort_field: params.sort,
            sort_direction: params.direction,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionItem {
    pub id: QuestionId,
    pub content: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub is_solved: bool,
    pub tags: Vec<String>,
}

impl From<QuestionSummary> for QuestionItem {
    fn from(summary: QuestionSummary) -> Self {
        Self {
            id: summary.question.id,
            content: summary.question.content,
            category: summary.question.category,
            created_at: summary.question.created_at,
            is_solved: summary.is_solved,
            tags: summary.tags,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub item: QuestionItem,
    pub updated_at: DateTime<Utc>,
}

/// `totalElements` is the exact count, or `null` when it could not be
/// computed; `hasNext` is always known.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPageBody {
    pub content: Vec<QuestionItem>,
    pub total_elements: Option<i64>,
    pub page: u32,
    pub size: u32,
    pub has_next: bool,
}

impl From<QuestionPage> for QuestionPageBody {
    fn from(page: QuestionPage) -> Self {
        Self {
            content: page.items.into_iter().map(QuestionItem::from).collect(),
            total_elements: match page.total {
                TotalCount::Exact(count) => Some(count),
                TotalCount::Unknown => None,
            },
            page: page.page,
            size: page.size,
            has_next: page.has_next,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultBody {
    #[serde(flatten)]
    pub page: QuestionPageBody,
    pub recommendations: Vec<RecommendedQuestion>,
}

fn user_of(principal: Option<AuthenticatedPrincipal>) -> Option<UserId> {
    principal.map(|AuthenticatedPrincipal(p)| p.user_id)
}

/// GET /api/v1/questions
pub async fn list_questions(
    State(state): State<AppState>,
    principal: Option<AuthenticatedPrincipal>,
    ApiQuery(params): ApiQuery<QuestionListParams>,
) -> Result<Json<QuestionPageBody>> {
    let page = state
        .search_service
        .search(params.into(), user_of(principal))
        .await?;
    Ok(Json(page.into()))
}

/// POST /api/v1/questions/search
///
/// Recommendations are fetched alongside the search and never fail it.
/// Rejected searches make no recommendation call.
pub async fn search_questions(
    State(state): State<AppState>,
    principal: Option<AuthenticatedPrincipal>,
    ApiJson(spec): ApiJson<SearchSpec>,
) -> Result<Json<SearchResultBody>> {
    let user = user_of(principal);
    let criteria = state.search_service.normalize(spec)?;
    state.search_service.authorize(&criteria, user)?;
    let recommend_request = RecommendRequest::from_criteria(&criteria);

    let (page, recommendations) = tokio::join!(
        state.search_service.search_criteria(&criteria, user),
        state.recommender.recommend(&recommend_request),
    );

    Ok(Json(SearchResultBody {
        page: page?.into(),
        recommendations,
    }))
}

/// GET /api/v1/questions/:id
pub async fn get_question(
    State(state): State<AppState>,
    principal: Option<AuthenticatedPrincipal>,
    Path(id): Path<i64>,
) -> Result<Json<QuestionDetail>> {
    let summary = state
        .search_service
        .get_question(QuestionId(id), user_of(principal))
        .await?;
    let updated_at = summary.question.updated_at;
    Ok(Json(QuestionDetail {
        item: summary.into(),
        updated_at,
    }))
}
