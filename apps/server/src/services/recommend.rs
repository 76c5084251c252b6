//! Recommendation service client
//!
//! Recommendations are advisory. Every failure (transport, timeout, non-2xx
//! status, undecodable body) yields an empty list and a warning.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::RecommendConfig;
use crate::metrics::RECOMMEND_REQUESTS_TOTAL;
use crate::models::SearchCriteria;

const RECOMMEND_PATH: &str = "/api/v1/recommend";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl RecommendRequest {
    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        Self {
            category: criteria.category.map(|c| c.as_str().to_string()),
            tags: criteria.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedQuestion {
    pub id: i64,
    pub content: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    #[serde(default)]
    pub recommended_questions: Vec<RecommendedQuestion>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("recommendation request timed out")]
    Timeout,

    #[error("recommendation request failed: {0}")]
    Transport(String),

    #[error("recommendation service returned status {0}")]
    Status(u16),

    #[error("recommendation response could not be decoded: {0}")]
    Decode(String),
}

impl RecommendError {
    fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RecommendError::Timeout
        } else {
            RecommendError::Transport(err.to_string())
        }
    }

    fn from_decode(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RecommendError::Timeout
        } else {
            RecommendError::Decode(err.to_string())
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RecommendError::Timeout => "timeout",
            RecommendError::Transport(_) => "transport_error",
            RecommendError::Status(_) => "status_error",
            RecommendError::Decode(_) => "decode_error",
        }
    }
}

/// Collapse a call outcome into the list shown to callers.
pub fn recommendations_or_empty(
    outcome: Result<RecommendResponse, RecommendError>,
) -> Vec<RecommendedQuestion> {
    match outcome {
        Ok(response) => {
            RECOMMEND_REQUESTS_TOTAL.with_label_values(&["success"]).inc();
            response.recommended_questions
        }
        Err(err) => {
            RECOMMEND_REQUESTS_TOTAL
                .with_label_values(&[err.label()])
                .inc();
            tracing::warn!(error = %err, "Recommendations unavailable, returning none");
            Vec::new()
        }
    }
}

#[async_trait]
pub trait Recommender: Send + Sync {
    /// Never fails; an unavailable service means no recommendations.
    async fn recommend(&self, request: &RecommendRequest) -> Vec<RecommendedQuestion>;
}

pub struct HttpRecommender {
    client: Client,
    endpoint: String,
}

impl HttpRecommender {
    pub fn new(config: &RecommendConfig) -> reqwest::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                RECOMMEND_PATH
            ),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, request: &RecommendRequest) -> Result<RecommendResponse, RecommendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(RecommendError::from_send)?;

        if !response.status().is_success() {
            return Err(RecommendError::Status(response.status().as_u16()));
        }

        response
            .json::<RecommendResponse>()
            .await
            .map_err(RecommendError::from_decode)
    }
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn recommend(&self, request: &RecommendRequest) -> Vec<RecommendedQuestion> {
        recommendations_or_empty(self.call(request).await)
    }
}

/// Used when recommendations are switched off.
pub struct DisabledRecommender;

#[async_trait]
impl Recommender for DisabledRecommender {
    async fn recommend(&self, _request: &RecommendRequest) -> Vec<RecommendedQuestion> {
        RECOMMEND_REQUESTS_TOTAL
            .with_label_values(&["disabled"])
            .inc();
        Vec::new()
    }
}
