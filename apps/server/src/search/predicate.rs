//! Filter predicates shared by the page finder and the counter
//!
//! A [`Predicate`] is a conjunction of [`Filter`]s. The same builder feeds
//! both the finder (which evaluates the tag clause separately) and the
//! counter (which needs the full filter set), so both see identical rules.

use crate::models::{Category, SearchCriteria, UserId};
use crate::{Error, Result};

/// Non-empty set of tag names. A question matches if it carries any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNames(Vec<String>);

impl TagNames {
    /// `None` for an empty set, which must never reach a query.
    pub fn new(names: Vec<String>) -> Option<Self> {
        if names.is_empty() {
            None
        } else {
            Some(Self(names))
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Category(Category),
    /// Case-insensitive substring match on content. Matched literally.
    ContentContains(String),
    AnyTag(TagNames),
    /// Whether `user_id` has (or has not) answered the question.
    Answered { user_id: UserId, answered: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Filter>,
}

impl Predicate {
    /// Matches every question.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: Filter) -> Self {
        self.clauses.push(filter);
        self
    }

    pub fn clauses(&self) -> &[Filter] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Whether the tag clause belongs in the built predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    /// Tags are evaluated by the caller (two-phase paging).
    Exclude,
    /// Tags are part of the predicate (counting).
    Include,
}

pub struct PredicateBuilder;

impl PredicateBuilder {
    /// Build the conjunction of every present filter.
    ///
    /// A solved-state filter without a user is an authentication error, not
    /// a silently dropped clause.
    pub fn build(
        criteria: &SearchCriteria,
        user: Option<UserId>,
        mode: TagMode,
    ) -> Result<Predicate> {
        let mut predicate = Predicate::always();

        if let Some(category) = criteria.category {
            predicate = predicate.and(Filter::Category(category));
        }

        if let Some(keyword) = criteria.keyword.as_deref().map(str::trim) {
            if !keyword.is_empty() {
                predicate = predicate.and(Filter::ContentContains(keyword.to_string()));
            }
        }

        if mode == TagMode::Include {
            if let Some(tags) = Self::tag_clause(criteria) {
                predicate = predicate.and(tags);
            }
        }

        if let Some(answered) = criteria.is_solved {
            let user_id = user.ok_or_else(|| {
                Error::AuthenticationRequired(
                    "filtering by isSolved requires an authenticated user".to_string(),
                )
            })?;
            predicate = predicate.and(Filter::Answered { user_id, answered });
        }

        Ok(predicate)
    }

    /// Tag clause for the criteria, or `None` when no usable tag remains.
    pub fn tag_clause(criteria: &SearchCriteria) -> Option<Filter> {
        let names: Vec<String> = criteria
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        TagNames::new(names).map(Filter::AnyTag)
    }
}
