//! Question Bank - interview question search service
//!
//! Serves a catalog of interview questions with:
//! - Filtered search by category, keyword, tags and solved state
//! - Deep-page friendly two-phase paging for tag filters
//! - Cached exact totals with a graceful fallback
//! - Batched tag and solved-state enrichment
//! - Best-effort recommendations from a companion service

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod search;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
