//! Exact totals with a TTL cache
//!
//! Totals are keyed by the normalized filter set. A cache outage degrades to
//! a direct count, and a failed count degrades to [`TotalCount::Unknown`];
//! neither fails the search.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use super::predicate::{PredicateBuilder, TagMode};
use crate::db::QuestionStore;
use crate::metrics::COUNT_CACHE_EVENTS_TOTAL;
use crate::models::{SearchCriteria, UserId};
use crate::{Error, Result};

/// Placeholder for an absent key component.
const ABSENT: &str = "*";

#[async_trait]
pub trait CountCache: Send + Sync {
    /// Fresh cached count for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    async fn put(&self, key: String, count: i64) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct CachedCount {
    count: i64,
    stored_at: Instant,
}

/// Process-local LRU with a fixed time-to-live per entry.
pub struct InMemoryCountCache {
    entries: Mutex<LruCache<String, CachedCount>>,
    ttl: Duration,
}

impl InMemoryCountCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CountCache for InMemoryCountCache {
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::CountCache("count cache lock poisoned".to_string()))?;

        match entries.get(key).copied() {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Ok(Some(entry.count)),
            Some(_) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: String, count: i64) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::CountCache("count cache lock poisoned".to_string()))?;
        entries.put(
            key,
            CachedCount {
                count,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }
}

/// Cache key over every filter that changes the total.
///
/// Components are percent-encoded so separators inside values cannot
/// collide. The user is part of the key only when the solved filter is set.
pub fn count_cache_key(criteria: &SearchCriteria, user: Option<UserId>) -> String {
    let category = criteria.category.map(|c| c.as_str()).unwrap_or(ABSENT);

    let keyword = criteria
        .keyword
        .as_deref()
        .map(|k| urlencoding::encode(k).into_owned())
        .unwrap_or_else(|| ABSENT.to_string());

    let mut tags: Vec<String> = criteria
        .tags
        .iter()
        .map(|t| urlencoding::encode(t).into_owned())
        .collect();
    tags.sort();
    tags.dedup();
    let tags = if tags.is_empty() {
        ABSENT.to_string()
    } else {
        tags.join(",")
    };

    let (solved, user) = match criteria.is_solved {
        Some(solved) => (
            solved.to_string(),
            user.map(|u| u.to_string()).unwrap_or_else(|| ABSENT.to_string()),
        ),
        None => (ABSENT.to_string(), ABSENT.to_string()),
    };

    format!("{category}:{keyword}:{tags}:{solved}:{user}")
}

/// Total number of matches for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalCount {
    Exact(i64),
    /// Neither the cache nor the store could produce a count. Callers fall
    /// back to the page's `has_next` flag.
    Unknown,
}

impl TotalCount {
    pub fn exact(self) -> Option<i64> {
        match self {
            TotalCount::Exact(count) => Some(count),
            TotalCount::Unknown => None,
        }
    }
}

pub struct CountEstimator {
    store: Arc<dyn QuestionStore>,
    cache: Arc<dyn CountCache>,
}

impl CountEstimator {
    pub fn new(store: Arc<dyn QuestionStore>, cache: Arc<dyn CountCache>) -> Self {
        Self { store, cache }
    }

    /// Total matches for the full filter set, tags included.
    ///
    /// Only predicate construction can fail; storage and cache failures
    /// degrade instead.
    pub async fn total(
        &self,
        criteria: &SearchCriteria,
        user: Option<UserId>,
    ) -> Result<TotalCount> {
        let predicate = PredicateBuilder::build(criteria, user, TagMode::Include)?;
        let key = count_cache_key(criteria, user);

        match self.cache.get(&key).await {
            Ok(Some(count)) => {
                COUNT_CACHE_EVENTS_TOTAL.with_label_values(&["hit"]).inc();
                return Ok(TotalCount::Exact(count));
            }
            Ok(None) => {
                COUNT_CACHE_EVENTS_TOTAL.with_label_values(&["miss"]).inc();
            }
            Err(e) => {
                COUNT_CACHE_EVENTS_TOTAL
                    .with_label_values(&["cache_error"])
                    .inc();
                tracing::warn!(
                    error = %e,
                    key = %key,
                    "Count cache read failed, counting directly"
                );
            }
        }

        match self.store.count_questions(&predicate).await {
            Ok(count) => {
                if let Err(e) = self.cache.put(key, count).await {
                    tracing::warn!(error = %e, "Count cache write failed");
                }
                Ok(TotalCount::Exact(count))
            }
            Err(e) => {
                COUNT_CACHE_EVENTS_TOTAL
                    .with_label_values(&["count_error"])
                    .inc();
                tracing::warn!(error = %e, "Question count failed, total is unknown");
                Ok(TotalCount::Unknown)
            }
        }
    }
}
