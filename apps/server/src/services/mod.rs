//! Business logic services

pub mod recommend;
pub mod search;
pub mod tags;

pub use recommend::{
    DisabledRecommender, HttpRecommender, RecommendRequest, RecommendedQuestion, Recommender,
};
pub use search::{QuestionPage, QuestionSearchService, QuestionSummary};
pub use tags::{CreateTagRequest, TagService};
