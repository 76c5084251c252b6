pub mod metrics;
pub mod questions;
