//! Collaborator doubles for failure paths.

use async_trait::async_trait;
use question_bank::{
    db::{InMemoryStore, QuestionStore},
    models::{PageWindow, Question, QuestionId, SortSpec, UserId},
    search::{CountCache, Predicate},
    services::{RecommendRequest, RecommendedQuestion, Recommender},
    Error, Result,
};
use std::sync::{Arc, Mutex};

/// Returns a fixed list and remembers the requests it saw.
#[derive(Default)]
pub struct StubRecommender {
    pub response: Vec<RecommendedQuestion>,
    pub seen: Mutex<Vec<RecommendRequest>>,
}

impl StubRecommender {
    pub fn returning(response: Vec<RecommendedQuestion>) -> Self {
        Self {
            response,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecommendRequest> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Recommender for StubRecommender {
    async fn recommend(&self, request: &RecommendRequest) -> Vec<RecommendedQuestion> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        self.response.clone()
    }
}

/// Cache whose every operation fails.
pub struct BrokenCountCache;

#[async_trait]
impl CountCache for BrokenCountCache {
    async fn get(&self, _key: &str) -> Result<Option<i64>> {
        Err(Error::CountCache("cache offline".to_string()))
    }

    async fn put(&self, _key: String, _count: i64) -> Result<()> {
        Err(Error::CountCache("cache offline".to_string()))
    }
}

/// Delegates to an [`InMemoryStore`] but fails every count.
pub struct CountFailingStore(pub Arc<InMemoryStore>);

#[async_trait]
impl QuestionStore for CountFailingStore {
    async fn find_ids(
        &self,
        predicate: &Predicate,
        sort: SortSpec,
        window: PageWindow,
    ) -> Result<Vec<QuestionId>> {
        self.0.find_ids(predicate, sort, window).await
    }

    async fn find_questions(
        &self,
        predicate: &Predicate,
        sort: SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Question>> {
        self.0.find_questions(predicate, sort, window).await
    }

    async fn load_questions(&self, ids: &[QuestionId], sort: SortSpec) -> Result<Vec<Question>> {
        self.0.load_questions(ids, sort).await
    }

    async fn count_questions(&self, _predicate: &Predicate) -> Result<i64> {
        Err(Error::Internal("count timed out".to_string()))
    }

    async fn tag_names_for(&self, ids: &[QuestionId]) -> Result<Vec<(QuestionId, String)>> {
        self.0.tag_names_for(ids).await
    }

    async fn answered_question_ids(
        &self,
        user_id: UserId,
        ids: &[QuestionId],
    ) -> Result<Vec<QuestionId>> {
        self.0.answered_question_ids(user_id, ids).await
    }
}
