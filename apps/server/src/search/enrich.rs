//! Batch enrichment of a page with tag names and solved state
//!
//! At most one tag query and one solved query per page, whatever its size.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::QuestionStore;
use crate::models::{QuestionId, UserId};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    tags: HashMap<QuestionId, Vec<String>>,
    solved: HashSet<QuestionId>,
}

impl Enrichment {
    /// Tag names for `id`; empty for untagged or unknown questions.
    pub fn tags_for(&self, id: QuestionId) -> &[String] {
        self.tags.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_solved(&self, id: QuestionId) -> bool {
        self.solved.contains(&id)
    }

    pub fn tag_map(&self) -> &HashMap<QuestionId, Vec<String>> {
        &self.tags
    }

    pub fn solved_ids(&self) -> &HashSet<QuestionId> {
        &self.solved
    }
}

pub struct ResultEnricher {
    store: Arc<dyn QuestionStore>,
}

impl ResultEnricher {
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self { store }
    }

    /// Every id gets a tag entry (possibly empty). Solved state is only
    /// looked up for an authenticated user.
    pub async fn enrich(&self, ids: &[QuestionId], user: Option<UserId>) -> Result<Enrichment> {
        if ids.is_empty() {
            return Ok(Enrichment::default());
        }

        let tag_rows = self.store.tag_names_for(ids);
        let solved_rows = async {
            match user {
                Some(user_id) => self.store.answered_question_ids(user_id, ids).await,
                None => Ok(Vec::new()),
            }
        };
        let (tag_rows, solved_rows) = tokio::try_join!(tag_rows, solved_rows)?;

        let mut tags: HashMap<QuestionId, Vec<String>> =
            ids.iter().map(|id| (*id, Vec::new())).collect();
        for (id, name) in tag_rows {
            if let Some(names) = tags.get_mut(&id) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        for names in tags.values_mut() {
            names.sort();
        }

        let wanted: HashSet<QuestionId> = ids.iter().copied().collect();
        let solved = solved_rows
            .into_iter()
            .filter(|id| wanted.contains(id))
            .collect();

        Ok(Enrichment { tags, solved })
    }
}
