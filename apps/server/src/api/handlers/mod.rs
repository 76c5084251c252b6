//! HTTP handlers

pub mod metrics;
pub mod questions;
pub mod tags;
