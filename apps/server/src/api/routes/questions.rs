//! Question and tag API routes

use crate::api::handlers::{questions, tags};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn question_routes() -> Router<AppState> {
    Router::new()
        .route("/questions", get(questions::list_questions))
        .route("/questions/search", post(questions::search_questions))
        .route("/questions/:id", get(questions::get_question))
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
}
