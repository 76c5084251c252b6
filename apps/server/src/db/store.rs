//! PostgreSQL implementation of the question and tag stores.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryScalar};
use sqlx::{PgPool, Postgres, Row};
use std::time::Instant;

use super::query_builder::{
    build_answered_ids_sql, build_load_by_ids_sql, build_tag_names_sql, BindValue, QueryBuilder,
};
use super::traits::{QuestionStore, TagStore};
use crate::metrics::{DB_QUERY_DURATION_SECONDS, DB_QUERY_ERRORS_TOTAL};
use crate::models::{PageWindow, Question, QuestionId, SortSpec, Tag, TagId, UserId};
use crate::search::Predicate;
use crate::{Error, Result};

#[derive(Clone)]
pub struct PostgresQuestionStore {
    pool: PgPool,
}

impl PostgresQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn bind_query<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    bind_values: Vec<BindValue>,
) -> Query<'q, Postgres, PgArguments> {
    for value in bind_values {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::TextArray(vs) => query.bind(vs),
            BindValue::BigInt(v) => query.bind(v),
            BindValue::BigIntArray(vs) => query.bind(vs),
        };
    }
    query
}

fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    bind_values: Vec<BindValue>,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for value in bind_values {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::TextArray(vs) => query.bind(vs),
            BindValue::BigInt(v) => query.bind(v),
            BindValue::BigIntArray(vs) => query.bind(vs),
        };
    }
    query
}

/// Record duration and failures for one query.
fn observe<T>(query_type: &str, started: Instant, result: sqlx::Result<T>) -> Result<T> {
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[query_type])
        .observe(started.elapsed().as_secs_f64());
    result.map_err(|e| {
        DB_QUERY_ERRORS_TOTAL.with_label_values(&[query_type]).inc();
        Error::Database(e)
    })
}

fn question_from_row(row: &PgRow) -> Result<Question> {
    let category: String = row.try_get("category")?;
    Ok(Question {
        id: QuestionId(row.try_get("id")?),
        content: row.try_get("content")?,
        category: category
            .parse()
            .map_err(|_| Error::Internal(format!("Unknown stored category: {category}")))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn tag_from_row(row: &PgRow) -> Result<Tag> {
    Ok(Tag {
        id: TagId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl QuestionStore for PostgresQuestionStore {
    async fn find_ids(
        &self,
        predicate: &Predicate,
        sort: SortSpec,
        window: PageWindow,
    ) -> Result<Vec<QuestionId>> {
        let (sql, bind_values) = QueryBuilder::new(predicate)
            .with_sort(sort)
            .with_window(window)
            .build_id_sql();

        let started = Instant::now();
        let result = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), bind_values)
            .fetch_all(&self.pool)
            .await;
        let ids = observe("find_ids", started, result)?;

        Ok(ids.into_iter().map(QuestionId).collect())
    }

    async fn find_questions(
        &self,
        predicate: &Predicate,
        sort: SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Question>> {
        let (sql, bind_values) = QueryBuilder::new(predicate)
            .with_sort(sort)
            .with_window(window)
            .build_sql();

        let started = Instant::now();
        let result = bind_query(sqlx::query(&sql), bind_values)
            .fetch_all(&self.pool)
            .await;
        let rows = observe("find_questions", started, result)?;

        rows.iter().map(question_from_row).collect()
    }

    async fn load_questions(&self, ids: &[QuestionId], sort: SortSpec) -> Result<Vec<Question>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (sql, bind_values) = build_load_by_ids_sql(ids, sort);

        let started = Instant::now();
        let result = bind_query(sqlx::query(&sql), bind_values)
            .fetch_all(&self.pool)
            .await;
        let rows = observe("load_questions", started, result)?;

        rows.iter().map(question_from_row).collect()
    }

    async fn count_questions(&self, predicate: &Predicate) -> Result<i64> {
        let (sql, bind_values) = QueryBuilder::new(predicate).build_count_sql();

        let started = Instant::now();
        let result = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), bind_values)
            .fetch_one(&self.pool)
            .await;
        observe("count_questions", started, result)
    }

    async fn tag_names_for(&self, ids: &[QuestionId]) -> Result<Vec<(QuestionId, String)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (sql, bind_values) = build_tag_names_sql(ids);

        let started = Instant::now();
        let result = bind_query(sqlx::query(&sql), bind_values)
            .fetch_all(&self.pool)
            .await;
        let rows = observe("tag_names", started, result)?;

        rows.iter()
            .map(|row| -> Result<(QuestionId, String)> {
                Ok((
                    QuestionId(row.try_get("question_id")?),
                    row.try_get::<String, _>("name")?,
                ))
            })
            .collect()
    }

    async fn answered_question_ids(
        &self,
        user_id: UserId,
        ids: &[QuestionId],
    ) -> Result<Vec<QuestionId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (sql, bind_values) = build_answered_ids_sql(user_id, ids);

        let started = Instant::now();
        let result = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), bind_values)
            .fetch_all(&self.pool)
            .await;
        let ids = observe("answered_ids", started, result)?;

        Ok(ids.into_iter().map(QuestionId).collect())
    }
}

#[async_trait]
impl TagStore for PostgresQuestionStore {
    async fn list_tag_names(&self) -> Result<Vec<String>> {
        let started = Instant::now();
        let result = sqlx::query_scalar::<_, String>("SELECT name FROM tag ORDER BY name")
            .fetch_all(&self.pool)
            .await;
        observe("list_tags", started, result)
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let started = Instant::now();
        let result = sqlx::query(
            r#"
            SELECT id, name, description, created_at
            FROM tag
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await;
        let row = observe("find_tag", started, result)?;

        row.as_ref().map(tag_from_row).transpose()
    }

    async fn find_or_create_tag(&self, name: &str, description: Option<&str>) -> Result<Tag> {
        if let Some(tag) = self.find_tag_by_name(name).await? {
            return Ok(tag);
        }

        // A concurrent insert of the same name loses the conflict and re-reads.
        let started = Instant::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tag (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await;
        let inserted = observe("insert_tag", started, result)?;

        if let Some(row) = inserted {
            return tag_from_row(&row);
        }

        self.find_tag_by_name(name)
            .await?
            .ok_or_else(|| Error::Conflict(format!("Tag '{name}' changed concurrently")))
    }
}
