//! Question search service
//!
//! Orchestrates one search request:
//! - Normalizes the request and builds predicates
//! - Runs the page fetch and the total count concurrently
//! - Enriches the page with tags and solved state in batch

use std::sync::Arc;

use crate::{
    config::SearchConfig,
    db::QuestionStore,
    models::{Question, QuestionId, SearchCriteria, SearchSpec, SortSpec, UserId},
    search::{
        CountCache, CountEstimator, PredicateBuilder, QuestionFinder, ResultEnricher, TagMode,
        TotalCount,
    },
    Error, Result,
};

/// A question with its tag names and the caller's solved state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSummary {
    pub question: Question,
    pub tags: Vec<String>,
    pub is_solved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPage {
    pub items: Vec<QuestionSummary>,
    /// Exact total. Authoritative when known.
    pub total: TotalCount,
    pub page: u32,
    pub size: u32,
    /// From the over-fetch probe; independent of `total`.
    pub has_next: bool,
    /// `offset + items + has_next`. A lower bound, never an exact count.
    pub estimated_total: i64,
}

pub struct QuestionSearchService {
    store: Arc<dyn QuestionStore>,
    finder: QuestionFinder,
    estimator: CountEstimator,
    enricher: ResultEnricher,
    default_size: u32,
    max_size: u32,
}

impl QuestionSearchService {
    pub fn new(
        store: Arc<dyn QuestionStore>,
        count_cache: Arc<dyn CountCache>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            finder: QuestionFinder::new(store.clone()),
            estimator: CountEstimator::new(store.clone(), count_cache),
            enricher: ResultEnricher::new(store.clone()),
            store,
            default_size: config.default_size,
            max_size: config.max_size,
        }
    }

    /// Validate and canonicalize a request with the configured page limits.
    pub fn normalize(&self, spec: SearchSpec) -> Result<SearchCriteria> {
        spec.normalize(self.default_size, self.max_size)
    }

    /// Fail the way `search_criteria` would before it touches the store.
    pub fn authorize(&self, criteria: &SearchCriteria, user: Option<UserId>) -> Result<()> {
        PredicateBuilder::build(criteria, user, TagMode::Exclude).map(|_| ())
    }

    /// Validate `spec` and run the search.
    pub async fn search(&self, spec: SearchSpec, user: Option<UserId>) -> Result<QuestionPage> {
        let criteria = self.normalize(spec)?;
        self.search_criteria(&criteria, user).await
    }

    #[tracing::instrument(
        name = "question_search",
        skip(self, criteria, user),
        fields(
            page = criteria.page.page,
            size = criteria.page.size,
            tags = criteria.tags.len(),
            user_id = user.map(|u| u.0)
        )
    )]
    pub async fn search_criteria(
        &self,
        criteria: &SearchCriteria,
        user: Option<UserId>,
    ) -> Result<QuestionPage> {
        let base = PredicateBuilder::build(criteria, user, TagMode::Exclude)?;
        let tag_clause = PredicateBuilder::tag_clause(criteria);

        let (total, found) = tokio::try_join!(
            self.estimator.total(criteria, user),
            self.finder
                .find(&base, tag_clause, criteria.sort, criteria.page),
        )?;

        let ids: Vec<QuestionId> = found.questions.iter().map(|q| q.id).collect();
        let enrichment = self.enricher.enrich(&ids, user).await?;
        let estimated_total = found.estimated_total();

        let items = found
            .questions
            .into_iter()
            .map(|question| QuestionSummary {
                tags: enrichment.tags_for(question.id).to_vec(),
                is_solved: enrichment.is_solved(question.id),
                question,
            })
            .collect();

        Ok(QuestionPage {
            items,
            total,
            page: criteria.page.page,
            size: criteria.page.size,
            has_next: found.has_next,
            estimated_total,
        })
    }

    /// One question with tags and solved state.
    pub async fn get_question(
        &self,
        id: QuestionId,
        user: Option<UserId>,
    ) -> Result<QuestionSummary> {
        let question = self
            .store
            .load_questions(&[id], SortSpec::default())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Question {id}")))?;

        let enrichment = self.enricher.enrich(&[id], user).await?;
        Ok(QuestionSummary {
            tags: enrichment.tags_for(id).to_vec(),
            is_solved: enrichment.is_solved(id),
            question,
        })
    }
}
