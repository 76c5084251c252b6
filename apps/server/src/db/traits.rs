//! Storage traits for questions and tags
//!
//! Any backend (PostgreSQL, in-memory, ...) can serve searches by
//! implementing these. Ordering passed as a [`SortSpec`] is always total:
//! implementations must break ties on id ascending.

use crate::{
    models::{PageWindow, Question, QuestionId, SortSpec, Tag, UserId},
    search::Predicate,
    Result,
};
use async_trait::async_trait;

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Ids of matching questions within `window`, in `sort` order.
    async fn find_ids(
        &self,
        predicate: &Predicate,
        sort: SortSpec,
        window: PageWindow,
    ) -> Result<Vec<QuestionId>>;

    /// Matching questions within `window`, in `sort` order.
    async fn find_questions(
        &self,
        predicate: &Predicate,
        sort: SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Question>>;

    /// Questions with the given ids, in `sort` order. Missing ids are skipped.
    async fn load_questions(&self, ids: &[QuestionId], sort: SortSpec) -> Result<Vec<Question>>;

    /// Exact number of matching questions.
    async fn count_questions(&self, predicate: &Predicate) -> Result<i64>;

    /// `(question, tag name)` pairs for every tag attached to `ids`.
    async fn tag_names_for(&self, ids: &[QuestionId]) -> Result<Vec<(QuestionId, String)>>;

    /// Subset of `ids` the user has answered.
    async fn answered_question_ids(
        &self,
        user_id: UserId,
        ids: &[QuestionId],
    ) -> Result<Vec<QuestionId>>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn list_tag_names(&self) -> Result<Vec<String>>;

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// Existing tag with `name`, or a newly created one. Concurrent callers
    /// with the same name observe the same tag.
    async fn find_or_create_tag(&self, name: &str, description: Option<&str>) -> Result<Tag>;
}
