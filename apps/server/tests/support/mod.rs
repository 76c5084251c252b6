pub mod fakes;

use anyhow::Context as _;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use question_bank::{
    api::create_router,
    db::{InMemoryStore, QuestionStore},
    models::{Category, Question, QuestionId, UserId},
    search::{CountCache, InMemoryCountCache},
    services::Recommender,
    state::{AppState, AppStateParts},
    Config,
};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tower::ServiceExt as _;

pub use fakes::*;

pub const TEST_SECRET: &str = "test-secret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

type WrapStore = Box<dyn FnOnce(Arc<InMemoryStore>) -> Arc<dyn QuestionStore>>;

/// Overrides applied when building a [`TestApp`].
#[derive(Default)]
pub struct TestAppOptions {
    /// Wraps the seeded store before searches see it.
    pub wrap_store: Option<WrapStore>,
    pub count_cache: Option<Arc<dyn CountCache>>,
    pub recommender: Option<Arc<dyn Recommender>>,
}

impl TestApp {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_options(TestAppOptions::default())
    }

    pub fn with_options(options: TestAppOptions) -> anyhow::Result<Self> {
        init_tracing();

        let store = Arc::new(InMemoryStore::new());
        let question_store: Arc<dyn QuestionStore> = match options.wrap_store {
            Some(wrap) => wrap(store.clone()),
            None => store.clone(),
        };
        let count_cache = options.count_cache.unwrap_or_else(|| {
            Arc::new(InMemoryCountCache::new(128, Duration::from_secs(3600)))
        });
        let recommender = options
            .recommender
            .unwrap_or_else(|| Arc::new(StubRecommender::default()));

        let state = AppState::from_parts(
            test_config(),
            AppStateParts {
                question_store,
                tag_store: store.clone(),
                count_cache,
                recommender,
            },
        )
        .context("build AppState")?;
        let router = create_router(state);

        Ok(Self {
            router,
            store,
        })
    }

    pub async fn seed(
        &self,
        content: &str,
        category: Category,
        tags: &[&str],
    ) -> anyhow::Result<Question> {
        let question = self.store.insert_question(content, category).await;
        for tag in tags {
            self.store.tag_question(question.id, tag).await?;
        }
        Ok(question)
    }

    pub async fn solve(&self, user: i64, id: QuestionId) -> anyhow::Result<()> {
        self.store.record_answer(UserId(user), id).await?;
        Ok(())
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path_and_query)
            .header(header::ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder
            .body(match body {
                Some(value) => Body::from(serde_json::to_vec(&value)?),
                None => Body::empty(),
            })
            .context("build request")?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;

        Ok((status, headers, body))
    }

    /// Request that must answer `expected`; returns the decoded JSON body.
    pub async fn json(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Value>,
        token: Option<&str>,
        expected: StatusCode,
    ) -> anyhow::Result<Value> {
        let (status, _headers, bytes) = self.request(method, path_and_query, body, token).await?;
        assert_eq!(
            status,
            expected,
            "{path_and_query}: unexpected status, body: {}",
            String::from_utf8_lossy(&bytes)
        );
        serde_json::from_slice(&bytes).context("decode JSON body")
    }

    pub async fn search(&self, body: Value, token: Option<&str>) -> anyhow::Result<Value> {
        self.json(
            Method::POST,
            "/api/v1/questions/search",
            Some(body),
            token,
            StatusCode::OK,
        )
        .await
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.enabled = true;
    config.auth.jwt_secret = Some(TEST_SECRET.to_string());
    config.recommend.enabled = false;
    config
}

/// Signed bearer token for `user` with `roles`.
pub fn token_for(user: i64, roles: &[&str]) -> String {
    let claims = serde_json::json!({
        "sub": user.to_string(),
        "roles": roles,
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("encode test token")
}

pub fn content_ids(page: &Value) -> Vec<i64> {
    page["content"]
        .as_array()
        .map(|items| items.iter().filter_map(|item| item["id"].as_i64()).collect())
        .unwrap_or_default()
}

pub fn ids_of(questions: &[Question]) -> Vec<i64> {
    questions.iter().map(|q| q.id.0).collect()
}

fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
