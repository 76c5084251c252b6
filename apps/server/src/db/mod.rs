//! Database layer - storage traits and backends

pub mod memory;
pub mod query_builder;
pub mod store;
pub mod traits;

pub use memory::{Fixture, InMemoryStore, QueryCounts};
pub use store::PostgresQuestionStore;
pub use traits::{QuestionStore, TagStore};
