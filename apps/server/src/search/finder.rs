//! Page retrieval
//!
//! Without a tag filter a single query fetches the page. With one, paging
//! runs in two phases: ids first (so the tag join cannot multiply or
//! reorder rows before OFFSET/LIMIT), then the rows for those ids.
//! Both strategies over-fetch one row to detect a next page.

use std::collections::HashMap;
use std::sync::Arc;

use super::predicate::{Filter, Predicate};
use crate::db::QuestionStore;
use crate::metrics::{QUESTION_SEARCH_RESULTS, QUESTION_SEARCH_TOTAL};
use crate::models::{PageRequest, Question, QuestionId, SortSpec};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundPage {
    pub questions: Vec<Question>,
    pub has_next: bool,
    pub offset: i64,
}

impl FoundPage {
    fn empty(page: PageRequest) -> Self {
        Self {
            questions: Vec::new(),
            has_next: false,
            offset: page.offset(),
        }
    }

    /// Lower bound on the number of matches implied by this page alone.
    ///
    /// Not an exact count: it never exceeds the rows seen so far plus one.
    pub fn estimated_total(&self) -> i64 {
        self.offset + self.questions.len() as i64 + i64::from(self.has_next)
    }
}

pub struct QuestionFinder {
    store: Arc<dyn QuestionStore>,
}

impl QuestionFinder {
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self { store }
    }

    /// Fetch one page. `base` must not contain the tag clause; pass it as
    /// `tag_clause` instead.
    pub async fn find(
        &self,
        base: &Predicate,
        tag_clause: Option<Filter>,
        sort: SortSpec,
        page: PageRequest,
    ) -> Result<FoundPage> {
        let (strategy, found) = match tag_clause {
            Some(tags) => ("two_phase", self.find_two_phase(base, tags, sort, page).await?),
            None => ("single_phase", self.find_single_phase(base, sort, page).await?),
        };

        QUESTION_SEARCH_TOTAL.with_label_values(&[strategy]).inc();
        QUESTION_SEARCH_RESULTS
            .with_label_values(&[strategy])
            .observe(found.questions.len() as f64);
        tracing::debug!(
            strategy,
            returned = found.questions.len(),
            has_next = found.has_next,
            "Question page fetched"
        );

        Ok(found)
    }

    async fn find_single_phase(
        &self,
        base: &Predicate,
        sort: SortSpec,
        page: PageRequest,
    ) -> Result<FoundPage> {
        let mut questions = self
            .store
            .find_questions(base, sort, page.probe_window())
            .await?;

        let has_next = trim_probe(&mut questions, page.size);
        Ok(FoundPage {
            questions,
            has_next,
            offset: page.offset(),
        })
    }

    async fn find_two_phase(
        &self,
        base: &Predicate,
        tags: Filter,
        sort: SortSpec,
        page: PageRequest,
    ) -> Result<FoundPage> {
        let mut id_predicate = Predicate::always().and(tags);
        for clause in base.clauses() {
            id_predicate = id_predicate.and(clause.clone());
        }

        let mut ids = self
            .store
            .find_ids(&id_predicate, sort, page.probe_window())
            .await?;
        if ids.is_empty() {
            return Ok(FoundPage::empty(page));
        }

        let has_next = trim_probe(&mut ids, page.size);
        let loaded = self.store.load_questions(&ids, sort).await?;

        Ok(FoundPage {
            questions: in_id_order(&ids, loaded),
            has_next,
            offset: page.offset(),
        })
    }
}

/// Drop the over-fetched row; returns whether it existed.
fn trim_probe<T>(rows: &mut Vec<T>, size: u32) -> bool {
    let size = size as usize;
    let has_next = rows.len() > size;
    rows.truncate(size);
    has_next
}

/// Arrange rows in the phase-one order. Ids deleted between phases are skipped.
fn in_id_order(ids: &[QuestionId], rows: Vec<Question>) -> Vec<Question> {
    let mut by_id: HashMap<QuestionId, Question> =
        rows.into_iter().map(|q| (q.id, q)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
