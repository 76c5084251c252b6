//! Shared application state

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::AuthManager,
    config::{Config, StorageBackend},
    db::{Fixture, InMemoryStore, PostgresQuestionStore, QuestionStore, TagStore},
    search::{CountCache, InMemoryCountCache},
    services::{
        DisabledRecommender, HttpRecommender, QuestionSearchService, Recommender, TagService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub search_service: Arc<QuestionSearchService>,
    pub tag_service: Arc<TagService>,
    pub recommender: Arc<dyn Recommender>,
    pub auth: AuthManager,
}

/// Collaborators the state is assembled from.
pub struct AppStateParts {
    pub question_store: Arc<dyn QuestionStore>,
    pub tag_store: Arc<dyn TagStore>,
    pub count_cache: Arc<dyn CountCache>,
    pub recommender: Arc<dyn Recommender>,
}

impl AppState {
    /// Connect to the configured backend and build every service.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (question_store, tag_store): (Arc<dyn QuestionStore>, Arc<dyn TagStore>) =
            match config.database.backend {
                StorageBackend::Postgres => {
                    let store = Arc::new(connect_postgres(&config).await?);
                    let questions: Arc<dyn QuestionStore> = store.clone();
                    let tags: Arc<dyn TagStore> = store;
                    (questions, tags)
                }
                StorageBackend::Memory => {
                    tracing::warn!("Using the in-memory store; data is lost on restart");
                    let store = Arc::new(memory_store(&config).await?);
                    let questions: Arc<dyn QuestionStore> = store.clone();
                    let tags: Arc<dyn TagStore> = store;
                    (questions, tags)
                }
            };

        let count_cache = Arc::new(InMemoryCountCache::new(
            config.search.count_cache_capacity,
            Duration::from_secs(config.search.count_cache_ttl_seconds),
        ));

        let recommender: Arc<dyn Recommender> = if config.recommend.enabled {
            Arc::new(
                HttpRecommender::new(&config.recommend)
                    .context("Failed to build recommendation client")?,
            )
        } else {
            Arc::new(DisabledRecommender)
        };

        Self::from_parts(
            config,
            AppStateParts {
                question_store,
                tag_store,
                count_cache,
                recommender,
            },
        )
    }

    pub fn from_parts(config: Config, parts: AppStateParts) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let auth = AuthManager::new(config.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize authentication: {e:?}"))?;

        let search_service = Arc::new(QuestionSearchService::new(
            parts.question_store,
            parts.count_cache,
            &config.search,
        ));
        let tag_service = Arc::new(TagService::new(parts.tag_store));

        Ok(Self {
            config,
            search_service,
            tag_service,
            recommender: parts.recommender,
            auth,
        })
    }
}

async fn memory_store(config: &Config) -> anyhow::Result<InMemoryStore> {
    let store = InMemoryStore::new();
    if let Some(path) = &config.database.seed_file {
        let fixture = Fixture::from_path(path)?;
        let loaded = store
            .load_fixture(fixture)
            .await
            .context("Failed to seed the in-memory store")?;
        tracing::info!(questions = loaded, path = %path.display(), "In-memory store seeded");
    }
    Ok(store)
}

async fn connect_postgres(config: &Config) -> anyhow::Result<PostgresQuestionStore> {
    let db = &config.database;
    let pool = PgPoolOptions::new()
        .min_connections(db.pool_min_size)
        .max_connections(db.pool_max_size)
        .acquire_timeout(Duration::from_secs(db.pool_timeout_seconds))
        .connect(&db.url)
        .await
        .context("Failed to connect to database")?;

    if db.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
    }

    tracing::info!(max_connections = db.pool_max_size, "Database pool ready");

    Ok(PostgresQuestionStore::new(pool))
}
