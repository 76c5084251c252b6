//! In-memory question and tag store.
//!
//! Evaluates predicates and orderings with the same semantics as the
//! PostgreSQL store. Used for local runs without a database, seeded from a
//! JSON [`Fixture`], and by tests, which can read per-method query counts.

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::traits::{QuestionStore, TagStore};
use crate::models::{Category, PageWindow, Question, QuestionId, SortSpec, Tag, TagId, UserId};
use crate::search::{Filter, Predicate};
use crate::{Error, Result};

/// 2024-01-01T00:00:00Z. Seeded questions are created one second apart from here.
const SEED_EPOCH: i64 = 1_704_067_200;

/// Number of store calls per method.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueryCounts {
    pub find_ids: usize,
    pub find_questions: usize,
    pub load_questions: usize,
    pub count_questions: usize,
    pub tag_names: usize,
    pub answered_ids: usize,
}

impl QueryCounts {
    pub fn total(&self) -> usize {
        self.find_ids
            + self.find_questions
            + self.load_questions
            + self.count_questions
            + self.tag_names
            + self.answered_ids
    }
}

#[derive(Default)]
struct Counters {
    find_ids: AtomicUsize,
    find_questions: AtomicUsize,
    load_questions: AtomicUsize,
    count_questions: AtomicUsize,
    tag_names: AtomicUsize,
    answered_ids: AtomicUsize,
}

#[derive(Default)]
struct Data {
    questions: BTreeMap<QuestionId, Question>,
    tags: BTreeMap<String, Tag>,
    question_tags: BTreeSet<(QuestionId, TagId)>,
    answers: HashSet<(UserId, QuestionId)>,
    next_question_id: i64,
    next_tag_id: i64,
}

impl Data {
    fn tag_names_of(&self, id: QuestionId) -> impl Iterator<Item = &str> + '_ {
        self.tags
            .values()
            .filter(move |tag| self.question_tags.contains(&(id, tag.id)))
            .map(|tag| tag.name.as_str())
    }

    fn matches(&self, question: &Question, filter: &Filter) -> bool {
        match filter {
            Filter::Category(category) => question.category == *category,
            Filter::ContentContains(keyword) => question
                .content
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
            Filter::AnyTag(names) => self.tag_names_of(question.id).any(|n| names.contains(n)),
            Filter::Answered { user_id, answered } => {
                self.answers.contains(&(*user_id, question.id)) == *answered
            }
        }
    }

    fn select(&self, predicate: &Predicate, sort: SortSpec) -> Vec<&Question> {
        let mut rows: Vec<&Question> = self
            .questions
            .values()
            .filter(|q| predicate.clauses().iter().all(|f| self.matches(q, f)))
            .collect();
        rows.sort_by(|a, b| sort.compare(a, b));
        rows
    }

    fn ensure_tag(&mut self, name: &str, description: Option<&str>) -> Tag {
        if let Some(tag) = self.tags.get(name) {
            return tag.clone();
        }
        self.next_tag_id += 1;
        let tag = Tag {
            id: TagId(self.next_tag_id),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        self.tags.insert(name.to_string(), tag.clone());
        tag
    }
}

fn window_of<T>(rows: Vec<T>, window: PageWindow) -> Vec<T> {
    rows.into_iter()
        .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
        .take(usize::try_from(window.limit).unwrap_or(0))
        .collect()
}

/// Seed data for the memory backend.
///
/// ```json
/// {
///   "tags": [{ "name": "sql", "description": "Relational queries" }],
///   "questions": [
///     { "content": "What is an index?", "category": "DATABASE",
///       "tags": ["sql"], "solvedBy": [1] }
///   ]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub tags: Vec<FixtureTag>,
    #[serde(default)]
    pub questions: Vec<FixtureQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureTag {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureQuestion {
    pub content: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Users who answered the question.
    #[serde(default)]
    pub solved_by: Vec<i64>,
}

impl Fixture {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    data: RwLock<Data>,
    counters: Counters,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a question created one second after the previous one.
    pub async fn insert_question(&self, content: &str, category: Category) -> Question {
        self.insert(content, category, None).await
    }

    pub async fn insert_question_at(
        &self,
        content: &str,
        category: Category,
        created_at: DateTime<Utc>,
    ) -> Question {
        self.insert(content, category, Some(created_at)).await
    }

    async fn insert(
        &self,
        content: &str,
        category: Category,
        created_at: Option<DateTime<Utc>>,
    ) -> Question {
        let mut data = self.data.write().await;
        data.next_question_id += 1;
        let created_at = created_at.unwrap_or_else(|| {
            Utc.timestamp_opt(SEED_EPOCH + data.next_question_id, 0)
                .single()
                .unwrap_or_else(Utc::now)
        });
        let question = Question {
            id: QuestionId(data.next_question_id),
            content: content.to_string(),
            category,
            created_at,
            updated_at: created_at,
        };
        data.questions.insert(question.id, question.clone());
        question
    }

    /// Attach a tag, creating it if needed.
    pub async fn tag_question(&self, id: QuestionId, tag_name: &str) -> Result<()> {
        let mut data = self.data.write().await;
        if !data.questions.contains_key(&id) {
            return Err(Error::NotFound(format!("Question {id}")));
        }
        let tag = data.ensure_tag(tag_name, None);
        data.question_tags.insert((id, tag.id));
        Ok(())
    }

    pub async fn record_answer(&self, user_id: UserId, id: QuestionId) -> Result<()> {
        let mut data = self.data.write().await;
        if !data.questions.contains_key(&id) {
            return Err(Error::NotFound(format!("Question {id}")));
        }
        data.answers.insert((user_id, id));
        Ok(())
    }

    /// Delete a question with its tag links and answers.
    pub async fn remove_question(&self, id: QuestionId) -> bool {
        let mut data = self.data.write().await;
        let removed = data.questions.remove(&id).is_some();
        data.question_tags.retain(|(qid, _)| *qid != id);
        data.answers.retain(|(_, qid)| *qid != id);
        removed
    }

    pub fn query_counts(&self) -> QueryCounts {
        QueryCounts {
            find_ids: self.counters.find_ids.load(Ordering::SeqCst),
            find_questions: self.counters.find_questions.load(Ordering::SeqCst),
            load_questions: self.counters.load_questions.load(Ordering::SeqCst),
            count_questions: self.counters.count_questions.load(Ordering::SeqCst),
            tag_names: self.counters.tag_names.load(Ordering::SeqCst),
            answered_ids: self.counters.answered_ids.load(Ordering::SeqCst),
        }
    }

    /// Insert every fixture tag and question; returns the number of questions.
    pub async fn load_fixture(&self, fixture: Fixture) -> Result<usize> {
        {
            let mut data = self.data.write().await;
            for tag in &fixture.tags {
                data.ensure_tag(tag.name.trim(), tag.description.as_deref());
            }
        }

        let loaded = fixture.questions.len();
        for entry in fixture.questions {
            let question = self.insert(&entry.content, entry.category, entry.created_at).await;
            for tag in &entry.tags {
                self.tag_question(question.id, tag.trim()).await?;
            }
            for user in entry.solved_by {
                self.record_answer(UserId(user), question.id).await?;
            }
        }
        Ok(loaded)
    }

    pub fn reset_query_counts(&self) {
        for counter in [
            &self.counters.find_ids,
            &self.counters.find_questions,
            &self.counters.load_questions,
            &self.counters.count_questions,
            &self.counters.tag_names,
            &self.counters.answered_ids,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl QuestionStore for InMemoryStore {
    async fn find_ids(
        &self,
        predicate: &Predicate,
        sort: SortSpec,
        window: PageWindow,
    ) -> Result<Vec<QuestionId>> {
        self.counters.find_ids.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read().await;
        let ids: Vec<QuestionId> = data
            .select(predicate, sort)
            .into_iter()
            .map(|q| q.id)
            .collect();
        Ok(window_of(ids, window))
    }

    async fn find_questions(
        &self,
        predicate: &Predicate,
        sort: SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Question>> {
        self.counters.find_questions.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read().await;
        let rows: Vec<Question> = data.select(predicate, sort).into_iter().cloned().collect();
        Ok(window_of(rows, window))
    }

    async fn load_questions(&self, ids: &[QuestionId], sort: SortSpec) -> Result<Vec<Question>> {
        self.counters.load_questions.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read().await;
        let wanted: HashSet<QuestionId> = ids.iter().copied().collect();
        let mut rows: Vec<Question> = wanted
            .iter()
            .filter_map(|id| data.questions.get(id).cloned())
            .collect();
        rows.sort_by(|a, b| sort.compare(a, b));
        Ok(rows)
    }

    async fn count_questions(&self, predicate: &Predicate) -> Result<i64> {
        self.counters.count_questions.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read().await;
        Ok(data.select(predicate, SortSpec::default()).len() as i64)
    }

    async fn tag_names_for(&self, ids: &[QuestionId]) -> Result<Vec<(QuestionId, String)>> {
        self.counters.tag_names.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read().await;
        let wanted: BTreeSet<QuestionId> = ids.iter().copied().collect();
        let mut pairs: Vec<(QuestionId, String)> = wanted
            .iter()
            .flat_map(|id| data.tag_names_of(*id).map(move |name| (*id, name.to_string())))
            .collect();
        pairs.sort();
        Ok(pairs)
    }

    async fn answered_question_ids(
        &self,
        user_id: UserId,
        ids: &[QuestionId],
    ) -> Result<Vec<QuestionId>> {
        self.counters.answered_ids.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read().await;
        let answered: BTreeSet<QuestionId> = ids
            .iter()
            .copied()
            .filter(|id| data.answers.contains(&(user_id, *id)))
            .collect();
        Ok(answered.into_iter().collect())
    }
}

#[async_trait]
impl TagStore for InMemoryStore {
    async fn list_tag_names(&self) -> Result<Vec<String>> {
        let data = self.data.read().await;
        Ok(data.tags.keys().cloned().collect())
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let data = self.data.read().await;
        Ok(data.tags.get(name).cloned())
    }

    async fn find_or_create_tag(&self, name: &str, description: Option<&str>) -> Result<Tag> {
        let mut data = self.data.write().await;
        Ok(data.ensure_tag(name, description))
    }
}
