//! Domain models for the question bank

pub mod question;
pub mod search;

pub use question::{Category, Question, QuestionId, Tag, TagId, UserId};
pub use search::{
    PageRequest, PageWindow, SearchCriteria, SearchSpec, SortDirection, SortField, SortSpec,
};
