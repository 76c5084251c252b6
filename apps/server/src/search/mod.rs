//! Question search: predicates, paging, totals and enrichment

pub mod count;
pub mod enrich;
pub mod finder;
pub mod predicate;

pub use count::{count_cache_key, CountCache, CountEstimator, InMemoryCountCache, TotalCount};
pub use enrich::{Enrichment, ResultEnricher};
pub use finder::{FoundPage, QuestionFinder};
pub use predicate::{Filter, Predicate, PredicateBuilder, TagMode, TagNames};
